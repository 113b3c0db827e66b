// CLI commands for running code and managing the language table
use anyhow::{bail, Context, Result};
use codepad_common::config::Config;
use codepad_common::types::{ExecutionRequest, ExecutionResult, Language};
use codepad_exec::{
    cancel_pair, ExecuteOptions, Executor, Judge0Client, LanguageRegistry, LanguageTable,
    LanguagesFile, PollPolicy,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

/// Guess the language from a source file extension
pub fn infer_language(file: &Path) -> Option<Language> {
    let ext = file.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "c" | "h" => Some(Language::C),
        "cpp" | "cc" | "cxx" | "hpp" => Some(Language::Cpp),
        "java" => Some(Language::Java),
        "py" => Some(Language::Python),
        _ => None,
    }
}

/// Render a result the way the web editor shows it
pub fn render_result(result: &ExecutionResult) -> String {
    let mut out = String::new();

    if !result.compile_output.is_empty() {
        out.push_str(&format!("Compilation Error:\n{}\n\n", result.compile_output));
    }
    if !result.stderr.is_empty() {
        out.push_str(&format!("Runtime Error:\n{}\n\n", result.stderr));
    }
    if !result.stdout.is_empty() {
        out.push_str(&format!("Output:\n{}", result.stdout));
    }
    if result.stdout.is_empty() && result.stderr.is_empty() && result.compile_output.is_empty() {
        out.push_str("No output");
    }

    out.push_str(&format!("\n\nStatus: {}", result.status.kind().label()));
    out.push_str(&format!("\nExecution Time: {}s", result.time));
    out.push_str(&format!("\nMemory Used: {} KB\n", result.memory));
    out
}

/// Run one source file through the execution backend
pub async fn run_program(
    language: Option<&str>,
    file: &Path,
    stdin_file: Option<&Path>,
    languages_config: &Path,
    max_attempts: Option<u32>,
    interval_ms: Option<u64>,
) -> Result<()> {
    let config = Config::from_env()?;

    let language = match language {
        Some(lang) => lang.to_string(),
        None => match infer_language(file) {
            Some(lang) => lang.to_string(),
            None => bail!(
                "Cannot infer language from '{}'; pass --language",
                file.display()
            ),
        },
    };

    let source_code = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let stdin = match stdin_file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => String::new(),
    };

    let mut policy = PollPolicy::from_config(&config);
    if let Some(n) = max_attempts {
        if n == 0 {
            bail!("--max-attempts must be at least 1");
        }
        policy.max_attempts = n;
    }
    if let Some(ms) = interval_ms {
        policy.interval = Duration::from_millis(ms);
    }

    let table = LanguageTable::load_or_default(languages_config)?;
    let backend = Judge0Client::from_config(&config).context("Failed to build backend HTTP client")?;
    println!("🚀 Running {} as {} on {}", file.display(), language, backend.base_url());

    let executor = Executor::new(LanguageRegistry::new(table), Arc::new(backend), policy);

    let (handle, signal) = cancel_pair();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            eprintln!("⚠ Interrupted - cancelling");
            handle.cancel();
        }
    });

    let request = ExecutionRequest {
        language,
        source_code,
        stdin,
    };
    let result = executor
        .execute_with(&request, ExecuteOptions::default().with_cancel(signal))
        .await?;

    println!();
    print!("{}", render_result(&result));
    println!("Token: {}", result.token);
    Ok(())
}

/// Print the configured language table
pub fn list_languages(languages_config: &Path) -> Result<()> {
    let table = LanguageTable::load_or_default(languages_config)?;
    let source = if languages_config.exists() {
        languages_config.display().to_string()
    } else {
        "built-in defaults".to_string()
    };

    println!("📋 Languages ({})", source);
    for (language, backend_id) in table.entries() {
        println!("  {:<8} -> {}", language, backend_id);
    }
    Ok(())
}

/// Add or update one language in the table file
pub fn set_language(
    languages_config: &Path,
    name: &str,
    backend_id: u32,
    version: Option<&str>,
) -> Result<()> {
    let language = match Language::parse(name) {
        Some(lang) => lang,
        None => bail!(
            "Unknown language '{}'; expected one of: c, cpp, java, python",
            name
        ),
    };

    let mut file = if languages_config.exists() {
        LanguagesFile::load(languages_config)?
    } else {
        LanguagesFile::from(&LanguageTable::default())
    };

    file.upsert(language, backend_id, version.map(str::to_string));

    // Refuse to write a table the service would reject at startup
    LanguageTable::from_file(&file)?;

    println!("📝 Updating {}...", languages_config.display());
    file.save(languages_config)?;
    println!("✅ {} -> {}", language, backend_id);
    Ok(())
}

/// Write the default language table
pub fn init_config(languages_config: &Path, force: bool) -> Result<()> {
    if languages_config.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            languages_config.display()
        );
    }

    LanguagesFile::from(&LanguageTable::default()).save(languages_config)?;
    println!("✅ Wrote default language table to {}", languages_config.display());
    Ok(())
}
