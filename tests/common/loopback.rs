//! Scripted FTP server on 127.0.0.1 for driving `NetworkEngine` end to end.
//!
//! Paths are normalised on the server side, so `CWD //` lands in `/`. It
//! advertises MLSD and lists with `cdir`/`pdir` records the way real
//! servers do.

use super::normalize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

#[derive(Default)]
struct Disk {
    dirs: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
    commands: Vec<String>,
}

pub struct LoopbackServer {
    pub port: u16,
    disk: Arc<Mutex<Disk>>,
}

impl LoopbackServer {
    /// Listens on an ephemeral port; `/` exists from the start.
    pub async fn start() -> Self {
        let mut disk = Disk::default();
        disk.dirs.insert("/".into());
        let disk = Arc::new(Mutex::new(disk));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let shared = disk.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let disk = shared.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, disk).await;
                });
            }
        });
        Self { port, disk }
    }

    pub fn mkdir(&self, path: &str) {
        self.disk.lock().unwrap().dirs.insert(normalize("/", path));
    }

    pub fn put(&self, path: &str, content: &[u8]) {
        self.disk
            .lock()
            .unwrap()
            .files
            .insert(normalize("/", path), content.to_vec());
    }

    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        self.disk.lock().unwrap().files.get(&normalize("/", path)).cloned()
    }

    /// Control commands received so far, `PASS` excluded.
    pub fn commands(&self) -> Vec<String> {
        self.disk.lock().unwrap().commands.clone()
    }

    pub fn count(&self, verb: &str) -> usize {
        self.commands()
            .iter()
            .filter(|c| c.split(' ').next() == Some(verb))
            .count()
    }
}

fn leaf_of<'a>(path: &'a str, dir: &str) -> Option<&'a str> {
    let prefix = if dir.ends_with('/') {
        dir.to_string()
    } else {
        format!("{}/", dir)
    };
    path.strip_prefix(prefix.as_str())
        .filter(|rest| !rest.is_empty() && !rest.contains('/'))
}

fn mlsd_body(disk: &Disk, cwd: &str) -> String {
    let mut body = format!("type=cdir;perm=el; {}\r\ntype=pdir;perm=el; ..\r\n", cwd);
    for name in disk.dirs.iter().filter_map(|d| leaf_of(d, cwd)) {
        body.push_str(&format!("type=dir;perm=el; {}\r\n", name));
    }
    for (path, content) in &disk.files {
        if let Some(name) = leaf_of(path, cwd) {
            body.push_str(&format!("type=file;size={};perm=r; {}\r\n", content.len(), name));
        }
    }
    body
}

async fn serve(stream: TcpStream, disk: Arc<Mutex<Disk>>) -> std::io::Result<()> {
    let (reader, mut w) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    let mut cwd = "/".to_string();
    let mut passive: Option<TcpListener> = None;

    w.write_all(b"220 loopback ready\r\n").await?;
    while let Some(line) = lines.next_line().await? {
        let (verb, arg) = line.split_once(' ').unwrap_or((line.as_str(), ""));
        let target = normalize(&cwd, arg);
        if verb != "PASS" {
            disk.lock().unwrap().commands.push(line.clone());
        }
        match verb {
            "USER" => w.write_all(b"331 password please\r\n").await?,
            "PASS" => w.write_all(b"230 logged in\r\n").await?,
            "FEAT" => {
                w.write_all(b"211-Features:\r\n MLSD\r\n UTF8\r\n211 End\r\n")
                    .await?
            }
            "OPTS" | "TYPE" => w.write_all(b"200 ok\r\n").await?,
            "SYST" => w.write_all(b"215 UNIX Type: L8\r\n").await?,
            "PWD" => {
                let reply = format!("257 \"{}\" is the current directory\r\n", cwd);
                w.write_all(reply.as_bytes()).await?
            }
            "CWD" => {
                let exists = disk.lock().unwrap().dirs.contains(&target);
                if exists {
                    cwd = target;
                    w.write_all(b"250 directory changed\r\n").await?
                } else {
                    w.write_all(b"550 no such directory\r\n").await?
                }
            }
            "PASV" => {
                let data = TcpListener::bind("127.0.0.1:0").await?;
                let port = data.local_addr()?.port();
                passive = Some(data);
                let reply = format!(
                    "227 Entering Passive Mode (127,0,0,1,{},{})\r\n",
                    port >> 8,
                    port & 0xff
                );
                w.write_all(reply.as_bytes()).await?
            }
            "MLSD" => {
                let body = mlsd_body(&disk.lock().unwrap(), &cwd);
                let Some(data) = passive.take() else {
                    w.write_all(b"425 use PASV first\r\n").await?;
                    continue;
                };
                w.write_all(b"150 listing\r\n").await?;
                let (mut conn, _) = data.accept().await?;
                conn.write_all(body.as_bytes()).await?;
                drop(conn);
                w.write_all(b"226 done\r\n").await?
            }
            "RETR" => {
                let content = disk.lock().unwrap().files.get(&target).cloned();
                match (content, passive.take()) {
                    (Some(content), Some(data)) => {
                        w.write_all(b"150 sending\r\n").await?;
                        let (mut conn, _) = data.accept().await?;
                        conn.write_all(&content).await?;
                        drop(conn);
                        w.write_all(b"226 done\r\n").await?
                    }
                    _ => w.write_all(b"550 no such file\r\n").await?,
                }
            }
            "STOR" => {
                let Some(data) = passive.take() else {
                    w.write_all(b"425 use PASV first\r\n").await?;
                    continue;
                };
                w.write_all(b"150 receiving\r\n").await?;
                let (mut conn, _) = data.accept().await?;
                let mut content = Vec::new();
                conn.read_to_end(&mut content).await?;
                disk.lock().unwrap().files.insert(target, content);
                w.write_all(b"226 stored\r\n").await?
            }
            "DELE" => {
                let removed = disk.lock().unwrap().files.remove(&target).is_some();
                if removed {
                    w.write_all(b"250 deleted\r\n").await?
                } else {
                    w.write_all(b"550 no such file\r\n").await?
                }
            }
            "QUIT" => {
                w.write_all(b"221 bye\r\n").await?;
                break;
            }
            _ => w.write_all(b"502 not implemented\r\n").await?,
        }
    }
    Ok(())
}
