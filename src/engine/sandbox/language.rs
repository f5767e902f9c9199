use std::fmt;

use crate::engine::sandbox::recipe::{Recipe, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Go,
    JavaScript,
    Python,
    Cpp,
    C,
    Java,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::Go,
        Language::JavaScript,
        Language::Python,
        Language::Cpp,
        Language::C,
        Language::Java,
    ];

    /// Canonical id, the form produced by the normalizer.
    pub fn id(&self) -> &'static str {
        match self {
            Language::Go => "go",
            Language::JavaScript => "js",
            Language::Python => "python",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::Java => "java",
        }
    }

    pub fn toolchain(&self) -> &'static dyn Toolchain {
        match self {
            Language::Go => &GoToolchain,
            Language::JavaScript => &NodeToolchain,
            Language::Python => &PythonToolchain,
            Language::Cpp => &GccToolchain::CPP,
            Language::C => &GccToolchain::C,
            Language::Java => &JavaToolchain,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Builds the sandbox recipe for one language.
pub trait Toolchain: Send + Sync {
    fn recipe(&self, code: &str, stdin: &str) -> Recipe;
}

impl Toolchain for Language {
    fn recipe(&self, code: &str, stdin: &str) -> Recipe {
        self.toolchain().recipe(code, stdin)
    }
}

pub struct GoToolchain;

impl Toolchain for GoToolchain {
    fn recipe(&self, code: &str, stdin: &str) -> Recipe {
        Recipe::new(
            "golang:1.22-alpine",
            "code.go",
            code,
            stdin,
            vec![Step::new("go", ["build", "-o", "exe", "code.go"])],
            Step::new("./exe", Vec::<String>::new()),
        )
    }
}

pub struct NodeToolchain;

impl Toolchain for NodeToolchain {
    fn recipe(&self, code: &str, stdin: &str) -> Recipe {
        Recipe::new(
            "node:22-alpine",
            "code.js",
            code,
            stdin,
            Vec::new(),
            Step::new("node", ["code.js"]),
        )
    }
}

pub struct PythonToolchain;

impl Toolchain for PythonToolchain {
    fn recipe(&self, code: &str, stdin: &str) -> Recipe {
        Recipe::new(
            "python:3.12-alpine",
            "code.py",
            code,
            stdin,
            Vec::new(),
            Step::new("python3", ["-I", "code.py"]),
        )
    }
}

pub struct GccToolchain {
    compiler: &'static str,
    source_name: &'static str,
}

impl GccToolchain {
    pub const CPP: GccToolchain = GccToolchain {
        compiler: "g++",
        source_name: "code.cpp",
    };
    pub const C: GccToolchain = GccToolchain {
        compiler: "gcc",
        source_name: "code.c",
    };
}

impl Toolchain for GccToolchain {
    fn recipe(&self, code: &str, stdin: &str) -> Recipe {
        Recipe::new(
            "gcc:14",
            self.source_name,
            code,
            stdin,
            vec![Step::new(
                self.compiler,
                ["-O2", "-o", "exe", self.source_name],
            )],
            Step::new("./exe", Vec::<String>::new()),
        )
    }
}

pub struct JavaToolchain;

impl Toolchain for JavaToolchain {
    fn recipe(&self, code: &str, stdin: &str) -> Recipe {
        Recipe::new(
            "eclipse-temurin:21-jdk-alpine",
            "Main.java",
            code,
            stdin,
            vec![Step::new("javac", ["Main.java"])],
            Step::new("java", ["-cp", ".", "Main"]),
        )
    }
}
