//! ASCVD CLI - form-driven cardiovascular risk classification

#![deny(warnings)]

// Global invariants enforced:
// - Nothing is calculated before the form is complete
// - Identical input yields byte-for-byte identical output

mod prompt;

use ascvd_core::config::{self, ReportFormat, ResolvedConfig};
use ascvd_core::form::fields;
use ascvd_core::{calculate, render_json, render_text, FormValues, RuleSetKind};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ascvd")]
#[command(about = "ASCVD risk classification and LDL / Non-HDL targets")]
#[command(version = env!("ASCVD_VERSION"))]
struct Cli {
    /// Log debug events to stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify risk from field values given as flags
    Assess {
        #[command(flatten)]
        output: OutputArgs,

        /// Set any field as key=value (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        #[command(flatten)]
        inputs: InputArgs,
    },
    /// Fill in the form interactively, then calculate
    Form {
        #[command(flatten)]
        output: OutputArgs,
    },
    /// List the fields collected by a rule set
    Fields {
        /// Rule set
        #[arg(long, default_value = "basic")]
        rules: RulesArg,
    },
    /// Inspect the configuration file
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without running a calculation
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Rule set (overrides config file)
    #[arg(long)]
    rules: Option<RulesArg>,

    /// Output format (overrides config file)
    #[arg(long)]
    format: Option<OutputFormat>,

    /// List the criteria that selected the risk category
    #[arg(long)]
    explain: bool,

    /// Path to config file (default: auto-discover)
    #[arg(long)]
    config: Option<PathBuf>,
}

/// One flag per form field. Unset flags keep the form default.
#[derive(Args, Default)]
struct InputArgs {
    #[arg(long)]
    age: Option<u32>,
    /// Male or Female (extended rules)
    #[arg(long)]
    sex: Option<String>,
    #[arg(long)]
    weight_kg: Option<f64>,
    #[arg(long)]
    height_cm: Option<f64>,

    /// Yes or No
    #[arg(long, value_name = "YES/NO")]
    diabetes: Option<String>,
    #[arg(long, value_name = "YES/NO")]
    prediabetes: Option<String>,
    #[arg(long, value_name = "YES/NO")]
    hypertension: Option<String>,
    #[arg(long, value_name = "YES/NO")]
    smoking: Option<String>,
    #[arg(long, value_name = "YES/NO")]
    family_history: Option<String>,
    #[arg(long, value_name = "YES/NO")]
    carotid_plaque: Option<String>,
    #[arg(long, value_name = "YES/NO")]
    menopause: Option<String>,
    #[arg(long, value_name = "YES/NO")]
    inflammatory_diseases: Option<String>,
    #[arg(long, value_name = "YES/NO")]
    nafld: Option<String>,
    #[arg(long, value_name = "YES/NO")]
    air_pollution: Option<String>,
    #[arg(long, value_name = "YES/NO")]
    ethnicity: Option<String>,
    #[arg(long, value_name = "YES/NO")]
    socioeconomic_factors: Option<String>,

    /// LDL cholesterol (mg/dL)
    #[arg(long)]
    ldl: Option<f64>,
    /// HDL cholesterol (mg/dL)
    #[arg(long)]
    hdl: Option<f64>,
    #[arg(long)]
    triglycerides: Option<f64>,
    #[arg(long)]
    non_hdl_cholesterol: Option<f64>,
    #[arg(long)]
    apo_b: Option<f64>,
    #[arg(long)]
    total_cholesterol: Option<f64>,

    /// CT coronary calcium score
    #[arg(long)]
    calcium_score: Option<u32>,
    /// Ankle-brachial index
    #[arg(long)]
    abi: Option<f64>,
    /// Lipoprotein(a) (mg/dL)
    #[arg(long)]
    lpa: Option<f64>,
}

impl InputArgs {
    fn to_form_values(&self) -> FormValues {
        let mut values = FormValues::new();
        let mut put = |key: &str, value: Option<String>| {
            if let Some(v) = value {
                values.insert(key, v);
            }
        };

        put("age", self.age.map(|v| v.to_string()));
        put("sex", self.sex.clone());
        put("weight_kg", self.weight_kg.map(|v| v.to_string()));
        put("height_cm", self.height_cm.map(|v| v.to_string()));
        put("diabetes", self.diabetes.clone());
        put("prediabetes", self.prediabetes.clone());
        put("hypertension", self.hypertension.clone());
        put("smoking", self.smoking.clone());
        put("family_history", self.family_history.clone());
        put("carotid_plaque", self.carotid_plaque.clone());
        put("menopause", self.menopause.clone());
        put("inflammatory_diseases", self.inflammatory_diseases.clone());
        put("nafld", self.nafld.clone());
        put("air_pollution", self.air_pollution.clone());
        put("ethnicity", self.ethnicity.clone());
        put("socioeconomic_factors", self.socioeconomic_factors.clone());
        put("ldl", self.ldl.map(|v| v.to_string()));
        put("hdl", self.hdl.map(|v| v.to_string()));
        put("triglycerides", self.triglycerides.map(|v| v.to_string()));
        put("non_hdl_cholesterol", self.non_hdl_cholesterol.map(|v| v.to_string()));
        put("apo_b", self.apo_b.map(|v| v.to_string()));
        put("total_cholesterol", self.total_cholesterol.map(|v| v.to_string()));
        put("calcium_score", self.calcium_score.map(|v| v.to_string()));
        put("abi", self.abi.map(|v| v.to_string()));
        put("lpa", self.lpa.map(|v| v.to_string()));

        values
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => ReportFormat::Text,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum RulesArg {
    Basic,
    Extended,
}

impl From<RulesArg> for RuleSetKind {
    fn from(rules: RulesArg) -> Self {
        match rules {
            RulesArg::Basic => RuleSetKind::Basic,
            RulesArg::Extended => RuleSetKind::Extended,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Settings for one calculation after applying CLI overrides
struct RunSettings {
    rules: RuleSetKind,
    format: ReportFormat,
    explain: bool,
    defaults: FormValues,
}

impl RunSettings {
    /// Load config from `dir` (or `--config`) and apply CLI overrides
    fn resolve(dir: &Path, output: &OutputArgs) -> anyhow::Result<Self> {
        let rules_override = output.rules.map(RuleSetKind::from);
        let resolved = config::load_and_resolve(dir, output.config.as_deref(), rules_override)?;
        if let Some(ref path) = resolved.config_path {
            tracing::debug!(path = %path.display(), "using config file");
        }

        Ok(RunSettings {
            rules: resolved.rules,
            format: output.format.map(ReportFormat::from).unwrap_or(resolved.format),
            explain: output.explain || resolved.explain,
            defaults: resolved.defaults,
        })
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Assess { output, set, inputs } => {
            let settings = RunSettings::resolve(&std::env::current_dir()?, &output)?;

            let mut values = settings.defaults.clone();
            values.merge(&inputs.to_form_values());
            for pair in &set {
                values.insert_pair(pair)?;
            }

            emit(&settings, &values)?;
        }
        Commands::Form { output } => {
            let settings = RunSettings::resolve(&std::env::current_dir()?, &output)?;

            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            let mut out = std::io::stdout();
            match prompt::run_form(settings.rules, &settings.defaults, &mut input, &mut out)? {
                Some(values) => {
                    println!();
                    emit(&settings, &values)?;
                }
                None => println!("Nothing calculated."),
            }
        }
        Commands::Fields { rules } => {
            print!("{}", render_fields(rules.into()));
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let resolved = load_config(path.as_deref())?;
                match resolved.config_path {
                    Some(ref p) => println!("Config valid: {}", p.display()),
                    None => println!("No config file found, using defaults"),
                }
            }
            ConfigAction::Show { path } => {
                let resolved = load_config(path.as_deref())?;
                print_config(&resolved);
            }
        },
    }

    Ok(())
}

/// Run the calculation and print the report
fn emit(settings: &RunSettings, values: &FormValues) -> anyhow::Result<()> {
    let report = calculate(settings.rules, values, settings.explain)?;
    match settings.format {
        ReportFormat::Text => print!("{}", render_text(&report)),
        ReportFormat::Json => println!("{}", render_json(&report)),
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ResolvedConfig> {
    let cwd = std::env::current_dir()?;
    config::load_and_resolve(&cwd, path, None)
}

fn render_fields(kind: RuleSetKind) -> String {
    let mut output = format!("{:<24} {:<14} {:<10} {}\n", "KEY", "RANGE", "DEFAULT", "LABEL");
    for spec in fields(kind) {
        output.push_str(&format!(
            "{:<24} {:<14} {:<10} {}\n",
            spec.key,
            spec.range_text(),
            spec.default_text(),
            spec.label
        ));
    }
    output
}

fn print_config(resolved: &ResolvedConfig) {
    match resolved.config_path {
        Some(ref p) => println!("Config file: {}", p.display()),
        None => println!("Config file: (none, using defaults)"),
    }
    println!("Rules:   {}", resolved.rules.as_str());
    println!(
        "Format:  {}",
        match resolved.format {
            ReportFormat::Text => "text",
            ReportFormat::Json => "json",
        }
    );
    println!("Explain: {}", resolved.explain);
    for spec in fields(resolved.rules) {
        if let Some(value) = resolved.defaults.get(spec.key) {
            println!("Default: {} = {}", spec.key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_become_form_values() {
        let cli = Cli::try_parse_from([
            "ascvd",
            "assess",
            "--rules",
            "extended",
            "--ldl",
            "135",
            "--smoking",
            "Yes",
            "--age",
            "61",
        ])
        .unwrap();
        let Commands::Assess { inputs, .. } = cli.command else {
            panic!("expected assess");
        };
        let values = inputs.to_form_values();
        assert_eq!(values.get("ldl"), Some("135"));
        assert_eq!(values.get("smoking"), Some("Yes"));
        assert_eq!(values.get("age"), Some("61"));
        assert_eq!(values.get("lpa"), None);
    }

    fn output_args(args: &[&str]) -> OutputArgs {
        let cli = Cli::try_parse_from(["ascvd", "form"].iter().chain(args).copied()).unwrap();
        let Commands::Form { output } = cli.command else {
            panic!("expected form");
        };
        output
    }

    #[test]
    fn test_rules_flag_overrides_config_rules() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".ascvdrc.json"), r#"{"defaults": {"smoking": true}}"#)
            .unwrap();

        assert!(RunSettings::resolve(dir.path(), &output_args(&[])).is_err());

        let settings =
            RunSettings::resolve(dir.path(), &output_args(&["--rules", "extended"])).unwrap();
        assert_eq!(settings.rules, RuleSetKind::Extended);
        assert!(settings.defaults.build(settings.rules).unwrap().smoking);
    }

    #[test]
    fn test_flags_override_config_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("ascvd.config.json"),
            r#"{"rules": "extended", "format": "json"}"#,
        )
        .unwrap();

        let from_config = RunSettings::resolve(dir.path(), &output_args(&[])).unwrap();
        assert_eq!(from_config.rules, RuleSetKind::Extended);
        assert_eq!(from_config.format, ReportFormat::Json);
        assert!(!from_config.explain);

        let overridden = RunSettings::resolve(
            dir.path(),
            &output_args(&["--rules", "basic", "--format", "text", "--explain"]),
        )
        .unwrap();
        assert_eq!(overridden.rules, RuleSetKind::Basic);
        assert_eq!(overridden.format, ReportFormat::Text);
        assert!(overridden.explain);
    }

    #[test]
    fn test_unset_flags_are_omitted() {
        assert!(InputArgs::default().to_form_values().is_empty());
    }

    #[test]
    fn test_render_fields_lists_catalog() {
        let text = render_fields(RuleSetKind::Basic);
        assert_eq!(text.lines().count(), 7);
        assert!(text.contains("calcium_score"));
        assert!(text.contains("0-1000"));
    }
}
