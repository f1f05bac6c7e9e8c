//! TOML configuration for the simulation binary: one `[[run]]` table per
//! specimen, validated the way the reference workspace validates its stack
//! configuration (unrecognized keys at every level are rejected).

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use toml::Value;

const EXPECTED_CONFIG_VERSION: &str = "1";

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    UnrecognizedVersion { found: String },
    UnrecognizedFields { path: &'static str, keys: Vec<String> },
    Parse(String),
    UnknownTrellis { name: String },
    UnknownInterleaver,
    EmptyRuns,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnrecognizedVersion { found } => {
                write!(f, "unrecognized config_version: {found}, expected {EXPECTED_CONFIG_VERSION}")
            }
            ConfigError::UnrecognizedFields { path, keys } => {
                write!(f, "unrecognized fields in {path}: {keys:?}")
            }
            ConfigError::Parse(msg) => write!(f, "failed to parse configuration: {msg}"),
            ConfigError::UnknownTrellis { name } => write!(f, "unknown trellis family: {name}"),
            ConfigError::UnknownInterleaver => write!(f, "run is missing an interleaver table"),
            ConfigError::EmptyRuns => write!(f, "configuration has no [[run]] entries"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Deserialize)]
struct RootDto {
    config_version: String,

    #[serde(default = "default_workers")]
    workers: usize,

    #[serde(rename = "run", default)]
    runs: Vec<RunDto>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

fn default_workers() -> usize {
    1
}

#[derive(Debug, Clone, Deserialize)]
struct RunDto {
    description: String,
    frame_length: usize,
    trellis: String,
    interleaver: InterleaverDto,
    ebn0_db: Vec<f64>,
    repeat_count: RepeatCountDto,
    iterations: usize,
    #[serde(default)]
    code_rate: Option<f64>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RepeatCountDto {
    Single(usize),
    PerPoint(Vec<usize>),
}

#[derive(Debug, Clone, Deserialize)]
struct InterleaverDto {
    #[serde(default)]
    block: Option<BlockInterleaverDto>,
    #[serde(default)]
    random: Option<RandomInterleaverDto>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct BlockInterleaverDto {
    width: usize,
    height: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct RandomInterleaverDto {
    seed: u64,
}

/// Named trellis family a `[[run]]` table may select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrellisFamily {
    Rsc4,
    Rsc8,
    Pass,
}

/// Which permutation a `[[run]]` table's interleaver describes.
#[derive(Debug, Clone, PartialEq)]
pub enum InterleaverSpec {
    Block { width: usize, height: usize },
    Random { seed: u64 },
}

/// One validated, fully-resolved run ready to become a `Specimen`.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub description: String,
    pub frame_length: usize,
    pub trellis: TrellisFamily,
    pub interleaver: InterleaverSpec,
    pub ebn0_db: Vec<f64>,
    pub repeat_count: turbo_codec::RepeatCount,
    pub iterations: usize,
    pub code_rate: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub workers: usize,
    pub runs: Vec<RunConfig>,
}

pub fn from_str(toml_str: &str) -> Result<SimConfig, ConfigError> {
    let root: RootDto = toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;

    if root.config_version != EXPECTED_CONFIG_VERSION {
        return Err(ConfigError::UnrecognizedVersion { found: root.config_version });
    }
    if !root.extra.is_empty() {
        return Err(ConfigError::UnrecognizedFields { path: "<root>", keys: sorted_keys(&root.extra) });
    }
    if root.runs.is_empty() {
        return Err(ConfigError::EmptyRuns);
    }

    let mut runs = Vec::with_capacity(root.runs.len());
    for run in root.runs {
        runs.push(resolve_run(run)?);
    }

    Ok(SimConfig { workers: root.workers, runs })
}

fn resolve_run(run: RunDto) -> Result<RunConfig, ConfigError> {
    if !run.extra.is_empty() {
        return Err(ConfigError::UnrecognizedFields { path: "run", keys: sorted_keys(&run.extra) });
    }
    if !run.interleaver.extra.is_empty() {
        return Err(ConfigError::UnrecognizedFields { path: "run.interleaver", keys: sorted_keys(&run.interleaver.extra) });
    }

    let trellis = match run.trellis.as_str() {
        "rsc4" => TrellisFamily::Rsc4,
        "rsc8" => TrellisFamily::Rsc8,
        "pass" => TrellisFamily::Pass,
        other => return Err(ConfigError::UnknownTrellis { name: other.to_string() }),
    };

    let interleaver = match (run.interleaver.block, run.interleaver.random) {
        (Some(b), None) => InterleaverSpec::Block { width: b.width, height: b.height },
        (None, Some(r)) => InterleaverSpec::Random { seed: r.seed },
        _ => return Err(ConfigError::UnknownInterleaver),
    };

    let repeat_count = match run.repeat_count {
        RepeatCountDto::Single(n) => turbo_codec::RepeatCount::Single(n),
        RepeatCountDto::PerPoint(v) => turbo_codec::RepeatCount::PerPoint(v),
    };

    Ok(RunConfig {
        description: run.description,
        frame_length: run.frame_length,
        trellis,
        interleaver,
        ebn0_db: run.ebn0_db,
        repeat_count,
        iterations: run.iterations,
        code_rate: run.code_rate,
    })
}

fn sorted_keys(map: &HashMap<String, Value>) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().cloned().collect();
    keys.sort();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = r#"
        config_version = "1"
        workers = 2

        [[run]]
        description = "rsc4 block"
        frame_length = 64
        trellis = "rsc4"
        ebn0_db = [0.0, 1.0, 2.0]
        repeat_count = 100
        iterations = 4

        [run.interleaver.block]
        width = 8
        height = 8
    "#;

    #[test]
    fn parses_a_well_formed_config() {
        let cfg = from_str(GOOD).unwrap();
        assert_eq!(cfg.workers, 2);
        assert_eq!(cfg.runs.len(), 1);
        assert_eq!(cfg.runs[0].frame_length, 64);
        assert_eq!(cfg.runs[0].trellis, TrellisFamily::Rsc4);
        assert_eq!(cfg.runs[0].interleaver, InterleaverSpec::Block { width: 8, height: 8 });
    }

    #[test]
    fn rejects_wrong_config_version() {
        let bad = GOOD.replacen("\"1\"", "\"999\"", 1);
        assert!(matches!(from_str(&bad), Err(ConfigError::UnrecognizedVersion { .. })));
    }

    #[test]
    fn rejects_unrecognized_top_level_field() {
        let bad = format!("{GOOD}\nbogus_field = 1\n");
        assert!(matches!(from_str(&bad), Err(ConfigError::UnrecognizedFields { .. })));
    }

    #[test]
    fn rejects_unknown_trellis_name() {
        let bad = GOOD.replace("\"rsc4\"", "\"rsc99\"");
        assert!(matches!(from_str(&bad), Err(ConfigError::UnknownTrellis { .. })));
    }

    #[test]
    fn rejects_empty_run_list() {
        let bad = r#"config_version = "1""#;
        assert!(matches!(from_str(bad), Err(ConfigError::EmptyRuns)));
    }

    #[test]
    fn accepts_per_point_repeat_count() {
        let cfg_str = r#"
            config_version = "1"

            [[run]]
            description = "pass per-point"
            frame_length = 16
            trellis = "pass"
            ebn0_db = [0.0, 1.0]
            repeat_count = [10, 20]
            iterations = 1

            [run.interleaver.random]
            seed = 99
        "#;
        let cfg = from_str(cfg_str).unwrap();
        assert!(matches!(cfg.runs[0].repeat_count, turbo_codec::RepeatCount::PerPoint(ref v) if v == &vec![10, 20]));
    }

    /// Hand-renders a single-run config back to TOML. `{:?}` is used for the
    /// Eb/N0 floats rather than `{}`/`.to_string()`, since e.g. `2.0.to_string()`
    /// yields `"2"`, which toml parses as an integer rather than a float.
    fn render_run_toml(run: &RunConfig) -> String {
        let trellis = match run.trellis {
            TrellisFamily::Rsc4 => "rsc4",
            TrellisFamily::Rsc8 => "rsc8",
            TrellisFamily::Pass => "pass",
        };
        let ebn0_db = run.ebn0_db.iter().map(|v| format!("{v:?}")).collect::<Vec<_>>().join(", ");
        let repeat_count = match &run.repeat_count {
            turbo_codec::RepeatCount::Single(n) => n.to_string(),
            turbo_codec::RepeatCount::PerPoint(v) => {
                format!("[{}]", v.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(", "))
            }
        };
        let interleaver_table = match run.interleaver {
            InterleaverSpec::Block { width, height } => {
                format!("[run.interleaver.block]\nwidth = {width}\nheight = {height}\n")
            }
            InterleaverSpec::Random { seed } => format!("[run.interleaver.random]\nseed = {seed}\n"),
        };
        let code_rate_line = match run.code_rate {
            Some(r) => format!("code_rate = {r:?}\n"),
            None => String::new(),
        };

        format!(
            "[[run]]\n\
             description = {description:?}\n\
             frame_length = {frame_length}\n\
             trellis = {trellis:?}\n\
             ebn0_db = [{ebn0_db}]\n\
             repeat_count = {repeat_count}\n\
             iterations = {iterations}\n\
             {code_rate_line}\n\
             {interleaver_table}",
            description = run.description,
            frame_length = run.frame_length,
            iterations = run.iterations,
        )
    }

    #[test]
    fn run_config_round_trips_through_toml() {
        let cfg = from_str(GOOD).unwrap();
        let original = cfg.runs[0].clone();

        let rendered = format!("config_version = \"1\"\n{}", render_run_toml(&original));
        let reloaded = from_str(&rendered).unwrap();

        assert_eq!(reloaded.runs.len(), 1);
        assert_eq!(reloaded.runs[0], original);
    }
}
