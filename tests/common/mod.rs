//! Common test utilities for integration tests
#![allow(dead_code)]

use anyhow::Result;
use kepctl::Proposal;
use kepctl::output::{Column, Renderer};
use kepctl::query::{LocalFinder, LocalReader};
use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;

/// Create a proposal with the fields the filters look at
pub fn kep(title: &str, sig: &str, status: &str, stage: &str) -> Proposal {
    Proposal {
        title: title.to_string(),
        owning_sig: sig.to_string(),
        status: status.to_string(),
        stage: stage.to_string(),
        ..Default::default()
    }
}

/// Write `keps/<sig>/<name>/kep.yaml` under `repo`
pub fn write_kep_dir(repo: &Path, sig: &str, name: &str, body: &str) {
    let dir = repo.join("keps").join(sig).join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("kep.yaml"), body).unwrap();
}

/// Write a single-file KEP `keps/<sig>/<name>` under `repo`
pub fn write_kep_file(repo: &Path, sig: &str, name: &str, body: &str) {
    let dir = repo.join("keps").join(sig);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), body).unwrap();
}

/// Minimal valid `kep.yaml`
pub fn kep_yaml(title: &str, sig: &str, status: &str, stage: &str) -> String {
    format!(
        "title: {}\nauthors:\n  - \"@someone\"\nowning-sig: {}\nstatus: {}\nstage: {}\nlast-updated: 2024-01-15\n",
        title, sig, status, stage
    )
}

/// Renderer that records what it was asked to render
#[derive(Default)]
pub struct RecordingRenderer {
    rendered: Rc<RefCell<Option<Vec<Proposal>>>>,
}

impl RecordingRenderer {
    pub fn handle(&self) -> Rc<RefCell<Option<Vec<Proposal>>>> {
        self.rendered.clone()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, _columns: &[Column], keps: &[Proposal], _out: &mut dyn Write) -> io::Result<()> {
        *self.rendered.borrow_mut() = Some(keps.to_vec());
        Ok(())
    }
}

/// Lets one fake serve as both finder and reader
pub struct Shared<T>(pub Rc<T>);

impl<T: LocalFinder> LocalFinder for Shared<T> {
    fn find_documents(&self, repo_path: &Path, sig: &str) -> Result<Vec<String>> {
        self.0.find_documents(repo_path, sig)
    }
}

impl<T: LocalReader> LocalReader for Shared<T> {
    fn read_document(&self, repo_path: &Path, sig: &str, name: &str) -> Result<Proposal> {
        self.0.read_document(repo_path, sig, name)
    }
}
