#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway TypeScript project on disk
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    /// Project with a default `tsconfig.json`
    pub fn new() -> Self {
        Self::with_config(r#"{ "compilerOptions": { "strict": true } }"#)
    }

    pub fn with_config(tsconfig: &str) -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("tsconfig.json"), tsconfig).unwrap();
        Self { dir }
    }

    /// Directory without any project configuration
    pub fn without_config() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn file(self, rel: &str, content: &str) -> Self {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }
}

pub const USER_SERVICE: &str = "\
import { Repository } from './repository';

export class UserService {
    constructor(private repo: Repository) {}

    findUser(id: string) {
        return this.repo.get(id);
    }

    deleteUser(id: string) {
        this.repo.remove(id);
    }
}

export function createUserService(repo: Repository): UserService {
    return new UserService(repo);
}
";

pub const REPOSITORY: &str = "\
export interface Repository {
    get(id: string): unknown;
    remove(id: string): void;
}

export default class {
    run() {}
}
";

pub const AUTH: &str = "\
export function authenticate(token: string): boolean {
    return token.length > 0;
}

export function authorize(role: string): boolean {
    return role === 'admin';
}
";

/// The standard two-file service project plus an auth module
pub fn service_project() -> Fixture {
    Fixture::new()
        .file("src/user-service.ts", USER_SERVICE)
        .file("src/repository.ts", REPOSITORY)
        .file("src/auth.ts", AUTH)
}
