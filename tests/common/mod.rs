#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use opforge::core::errors::Result;
use opforge::logger::diagnostics::Diagnostics;
use opforge::reflect::descriptor::UniverseDescriptor;
use opforge::reflect::universe::ClassUniverse;
use opforge::reflection::model::{ModelSettings, OperationModel};

/// User classes shared by the integration tests, on top of the core
/// library.
pub const FIXTURE: &str = r#"{"classes":[
  {"name":"pkg.A","modifiers":["public"],
   "constructors":[{"modifiers":["public"]}],
   "methods":[{"name":"f","modifiers":["public"],"params":["String"],"returns":"int"}]},
  {"name":"pkg.Hidden","modifiers":[],
   "constructors":[{"modifiers":["public"]}],
   "methods":[{"name":"f","modifiers":["public"],"params":["String"],"returns":"int"}]},
  {"name":"pkg.Impl","modifiers":[],
   "methods":[{"name":"size","modifiers":["public"],"returns":"int"}]},
  {"name":"pkg.Facade","modifiers":["public"],"superclass":"pkg.Impl",
   "constructors":[{"modifiers":["public"]}],
   "methods":[{"name":"size","modifiers":["public"],"returns":"int","bridge":true,"synthetic":true},
              {"name":"clone","modifiers":["public"],"returns":"pkg.Facade"},
              {"name":"clone","modifiers":["public"],"returns":"java.lang.Object","bridge":true,"synthetic":true}]},
  {"name":"pkg.Color","kind":"enum","modifiers":["public"],"superclass":"java.lang.Enum<pkg.Color>",
   "methods":[{"name":"describe","modifiers":["public"],"returns":"String"}],
   "enum_constants":[{"name":"RED"},{"name":"GREEN","body":"pkg.Color$1"}]},
  {"name":"pkg.Color$1","modifiers":[],"superclass":"pkg.Color",
   "methods":[{"name":"describe","modifiers":["public"],"returns":"String"},
              {"name":"toString","modifiers":["public"],"returns":"String"}]},
  {"name":"pkg.Base","modifiers":["public"],
   "constructors":[{"modifiers":["public"]}],
   "methods":[{"name":"toString","modifiers":["public"],"returns":"String"},
              {"name":"area","modifiers":["public"],"returns":"double"}]},
  {"name":"pkg.MyClass","modifiers":["public"],"superclass":"pkg.Base",
   "constructors":[{"modifiers":["public"]}],
   "methods":[{"name":"toString","modifiers":["public"],"returns":"String"}]},
  {"name":"pkg.Box","modifiers":["public"],
   "type_params":[{"name":"T","bounds":["java.lang.Comparable<T>"]}],
   "constructors":[{"modifiers":["public"],"params":["T"]}],
   "methods":[{"name":"get","modifiers":["public"],"returns":"T"},
              {"name":"fill","modifiers":["public"],"params":["java.util.Collection<? extends T>"]}]},
  {"name":"pkg.Outer","modifiers":["public"],
   "constructors":[{"modifiers":["public"]}]},
  {"name":"pkg.Outer$Inner","modifiers":["public","static"],
   "constructors":[{"modifiers":["public"],"params":["int"]}],
   "methods":[{"name":"value","modifiers":["public"],"returns":"int"}]},
  {"name":"pkg.Counter","modifiers":["public"],
   "constructors":[{"modifiers":["public"]}],
   "methods":[{"name":"names","modifiers":["public"],"returns":"java.util.List<String>"}],
   "fields":[{"name":"count","modifiers":["public"],"type":"int"},
             {"name":"LIMIT","modifiers":["public","static","final"],"type":"int"}]},
  {"name":"pkg.Foo","modifiers":["public"],
   "constructors":[{"modifiers":["public"]}],
   "methods":[{"name":"Foo","modifiers":["public"],"returns":"int"}]}
]}"#;

pub fn descriptor() -> UniverseDescriptor {
    UniverseDescriptor::from_json(FIXTURE).expect("fixture descriptor parses")
}

pub fn universe() -> Arc<ClassUniverse> {
    ClassUniverse::from_descriptor(descriptor()).expect("fixture universe builds")
}

pub fn settings(classes: &[&str]) -> ModelSettings {
    ModelSettings {
        test_classes: classes.iter().map(|c| (*c).to_string()).collect(),
        ..ModelSettings::default()
    }
}

pub fn build(universe: &Arc<ClassUniverse>, settings: &ModelSettings) -> Result<OperationModel> {
    OperationModel::build(Arc::clone(universe), settings, Diagnostics::disabled())
}

/// Rendered operations, in model order.
pub fn describe<'a>(
    universe: &ClassUniverse,
    ops: impl IntoIterator<Item = &'a opforge::operation::typed::TypedOperation>,
) -> Vec<String> {
    ops.into_iter()
        .map(|op| op.describe(universe).to_string())
        .collect()
}

/// Write the fixture descriptor into `dir` and return its path.
pub fn write_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("universe.json");
    fs::write(&path, FIXTURE).expect("write fixture descriptor");
    path
}

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_opforge") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) { "opforge.exe" } else { "opforge" };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve opforge binary path for integration test"),
    }
}

pub fn run_cli_case(case_name: &str, args: &[&str]) -> CmdResult {
    let root = std::env::temp_dir().join("opforge-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let output = Command::new(&bin_path)
        .args(args)
        .env("HOME", &root)
        .env("RUST_BACKTRACE", "1")
        .env_remove("OPF_OUTPUT_FORMAT")
        .output()
        .expect("execute opforge command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}
