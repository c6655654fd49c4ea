#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use std::env;
use std::fs;
use std::path::PathBuf;

/// A throwaway HOME and database for one test.
pub struct Sandbox {
    pub home: PathBuf,
    pub db: String,
}

impl Sandbox {
    /// Fresh directory under the system temp dir, initialised with `init --test`.
    pub fn new(name: &str) -> Self {
        let mut home = env::temp_dir();
        home.push(format!("turnqr_{}_{}", name, std::process::id()));
        fs::remove_dir_all(&home).ok();
        fs::create_dir_all(&home).expect("create sandbox");

        let db = home.join("turnqr.sqlite").to_string_lossy().to_string();
        let sb = Self { home, db };
        sb.cmd(&["--test", "init"]).assert().success();
        sb
    }

    /// `turnqr --db <sandbox db> <args>` with HOME pointing at the sandbox.
    pub fn cmd(&self, args: &[&str]) -> Command {
        let mut c = cargo_bin_cmd!("turnqr");
        c.env("HOME", &self.home).arg("--db").arg(&self.db).args(args);
        c
    }

    pub fn out_file(&self, name: &str) -> String {
        let p = self.home.join(name);
        fs::remove_file(&p).ok();
        p.to_string_lossy().to_string()
    }

    /// One location selected in the settings, with a business-wide token and
    /// an employee assigned to it.
    pub fn with_business(name: &str, token: &str) -> Self {
        let sb = Self::new(name);
        sb.cmd(&["location", "add", "Centro", "--no-token"]).assert().success();
        sb.cmd(&["settings", "set", "--token", token, "--location", "1"])
            .assert()
            .success();
        sb.cmd(&["employee", "add", "ana", "--name", "Ana", "--role", "cook"])
            .assert()
            .success();
        sb.cmd(&["employee", "assign", "ana", "1"]).assert().success();
        sb
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        fs::remove_dir_all(&self.home).ok();
    }
}
