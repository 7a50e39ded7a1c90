use log::info;
use memfs::{FileSystem, FsError, OpenMode};

pub fn main() -> Result<(), FsError> {
    env_logger::init();

    let mut fs = FileSystem::new();

    fs.mkdir("/docs", 0o755)?;
    let fd = fs.creat("/docs/notes.txt", 0o644)?;

    let written = fs.write(fd, b"Simple file content")?;
    println!("Wrote {} bytes to file", written);
    fs.close(fd)?;

    let read_fd = fs.open("/docs/notes.txt", OpenMode::RO, 0)?;
    println!("Opened file for reading with fd {}", read_fd);

    let content = fs.read(read_fd, 1024)?;
    println!("File contents: {}", String::from_utf8_lossy(&content));

    fs.close(read_fd)?;
    println!("Closed file after reading");

    println!("Root directory contents: {:?}", fs.readdir("/")?);
    println!("Docs directory contents: {:?}", fs.readdir("/docs")?);

    if let Some(stat) = fs.stat("/docs/notes.txt") {
        println!("File inode: {}, size: {}", stat.ino, stat.size);
    }

    let sb = fs.super_block();
    info!(
        "{} of {} inodes in use.",
        sb.used_inodes(),
        sb.inodes_count
    );
    Ok(())
}
