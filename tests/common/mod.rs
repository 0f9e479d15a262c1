//! In-memory transfer engine for driving the tree API without a server.

#![allow(dead_code)]

pub mod loopback;

use async_trait::async_trait;
use ftptree::{
    Client, EngineSession, FtpConnectionConfig, FtpEntry, FtpEntryKind, FtpError, FtpResult,
    TransferEngine,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncReadExt};

#[derive(Default)]
struct Tree {
    dirs: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
    links: BTreeSet<String>,
}

/// Server-side state shared by every session the engine opens.
#[derive(Default)]
pub struct MemoryServer {
    tree: Mutex<Tree>,
    commands: Mutex<Vec<String>>,
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    pub fail_connect: AtomicBool,
    pub fail_transfers: AtomicBool,
}

impl MemoryServer {
    pub fn new() -> Arc<Self> {
        let server = Self::default();
        server.tree.lock().unwrap().dirs.insert("/".into());
        Arc::new(server)
    }

    pub fn mkdir(&self, path: &str) {
        self.tree.lock().unwrap().dirs.insert(normalize("/", path));
    }

    pub fn put(&self, path: &str, content: &[u8]) {
        self.tree
            .lock()
            .unwrap()
            .files
            .insert(normalize("/", path), content.to_vec());
    }

    pub fn symlink(&self, path: &str) {
        self.tree.lock().unwrap().links.insert(normalize("/", path));
    }

    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        self.tree.lock().unwrap().files.get(&normalize("/", path)).cloned()
    }

    /// Commands seen so far with the paths exactly as sent, e.g. `CWD //`,
    /// `LIST`, `RETR /docs/a.txt`.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    fn record(&self, command: String) {
        self.commands.lock().unwrap().push(command);
    }
}

/// Absolute path with repeated and trailing slashes collapsed.
pub fn normalize(cwd: &str, path: &str) -> String {
    let joined = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("{}/{}", cwd, path)
    };
    let parts: Vec<&str> = joined.split('/').filter(|p| !p.is_empty()).collect();
    format!("/{}", parts.join("/"))
}

fn parent_and_leaf(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some(("", leaf)) => ("/", leaf),
        Some((parent, leaf)) => (parent, leaf),
        None => ("/", path),
    }
}

pub struct MemoryEngine {
    pub server: Arc<MemoryServer>,
}

#[async_trait]
impl TransferEngine for MemoryEngine {
    async fn connect(&self, config: &FtpConnectionConfig) -> FtpResult<Box<dyn EngineSession>> {
        if self.server.fail_connect.load(Ordering::SeqCst) {
            return Err(FtpError::connection_failed(format!(
                "Cannot reach {}",
                config.address()
            )));
        }
        let n = self.server.connects.fetch_add(1, Ordering::SeqCst);
        self.server.record("CONNECT".into());
        Ok(Box::new(MemorySession {
            id: format!("mem-{}", n + 1),
            server: self.server.clone(),
            cwd: "/".into(),
            connected: true,
        }))
    }
}

pub struct MemorySession {
    id: String,
    server: Arc<MemoryServer>,
    cwd: String,
    connected: bool,
}

impl MemorySession {
    fn check_transfer(&self, verb: &str) -> FtpResult<()> {
        if self.server.fail_transfers.load(Ordering::SeqCst) {
            return Err(FtpError::transfer_failed(format!("{} aborted: connection reset", verb)));
        }
        Ok(())
    }
}

#[async_trait]
impl EngineSession for MemorySession {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn disconnect(&mut self) -> FtpResult<()> {
        if self.connected {
            self.connected = false;
            self.server.disconnects.fetch_add(1, Ordering::SeqCst);
            self.server.record("QUIT".into());
        }
        Ok(())
    }

    async fn print_working_directory(&mut self) -> FtpResult<String> {
        self.server.record("PWD".into());
        Ok(self.cwd.clone())
    }

    async fn change_working_directory(&mut self, path: &str) -> FtpResult<bool> {
        let target = normalize(&self.cwd, path);
        self.server.record(format!("CWD {}", path));
        let exists = self.server.tree.lock().unwrap().dirs.contains(&target);
        if exists {
            self.cwd = target;
        }
        Ok(exists)
    }

    async fn list_files(&mut self) -> FtpResult<Vec<FtpEntry>> {
        self.server.record("LIST".into());
        let tree = self.server.tree.lock().unwrap();
        let in_cwd = |p: &&String| p.as_str() != "/" && parent_and_leaf(p).0 == self.cwd;
        let leaf = |p: &String| parent_and_leaf(p).1.to_string();

        let mut entries: Vec<FtpEntry> = tree
            .dirs
            .iter()
            .filter(in_cwd)
            .map(|p| FtpEntry::new(leaf(p), FtpEntryKind::Directory))
            .collect();
        entries.extend(tree.files.iter().filter(|(p, _)| in_cwd(p)).map(|(p, c)| {
            FtpEntry::new(leaf(p), FtpEntryKind::File).with_size(c.len() as u64)
        }));
        entries.extend(
            tree.links
                .iter()
                .filter(in_cwd)
                .map(|p| FtpEntry::new(leaf(p), FtpEntryKind::Symlink)),
        );
        Ok(entries)
    }

    async fn retrieve_file(&mut self, path: &str) -> FtpResult<Option<Vec<u8>>> {
        let target = normalize(&self.cwd, path);
        self.server.record(format!("RETR {}", path));
        self.check_transfer("RETR")?;
        Ok(self.server.tree.lock().unwrap().files.get(&target).cloned())
    }

    async fn store_file(
        &mut self,
        path: &str,
        content: &mut (dyn AsyncRead + Send + Unpin),
    ) -> FtpResult<bool> {
        let target = normalize(&self.cwd, path);
        self.server.record(format!("STOR {}", path));
        self.check_transfer("STOR")?;
        let mut data = Vec::new();
        content.read_to_end(&mut data).await?;
        let mut tree = self.server.tree.lock().unwrap();
        if !tree.dirs.contains(parent_and_leaf(&target).0) {
            return Ok(false);
        }
        tree.files.insert(target, data);
        Ok(true)
    }

    async fn delete_file(&mut self, path: &str) -> FtpResult<bool> {
        let target = normalize(&self.cwd, path);
        self.server.record(format!("DELE {}", path));
        self.check_transfer("DELE")?;
        Ok(self.server.tree.lock().unwrap().files.remove(&target).is_some())
    }
}

/// A client over a fresh in-memory server.
pub fn memory_client() -> (Client, Arc<MemoryServer>) {
    let server = MemoryServer::new();
    let engine = MemoryEngine {
        server: server.clone(),
    };
    let config = FtpConnectionConfig::new("memory.test", 21, "tester", "secret");
    (Client::with_engine(Arc::new(engine), config), server)
}

/// `/docs/{a.txt,b.txt,2024/,latest@}` and `/pub/README`.
pub fn sample_client() -> (Client, Arc<MemoryServer>) {
    let (client, server) = memory_client();
    server.mkdir("/docs");
    server.mkdir("/docs/2024");
    server.mkdir("/pub");
    server.put("/docs/a.txt", b"alpha");
    server.put("/docs/b.txt", b"bravo");
    server.put("/pub/README", b"read me");
    server.symlink("/docs/latest");
    (client, server)
}
