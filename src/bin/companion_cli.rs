//! Novel Companion CLI
//!
//! 离线维护命令：
//! - `import-metadata [PATH]`  导入小说元数据 JSON
//! - `analyze-chapters --novel-title T --dir D`  逐文件 LLM 分析章节
//! - `export-novels OUTPUT`  导出全部小说元数据

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};

use novel_companion::application::{
    AnalyzeChapterText, AnalyzeChapterTextHandler, ChapterOutcome, ExportNovels,
    ExportNovelsHandler, ImportNovelMetadata, ImportNovelMetadataHandler, NovelRepositoryPort,
};
use novel_companion::config::{load_config_from_path, AppConfig};
use novel_companion::domain::novel::chapter_number_from_file_stem;
use novel_companion::infrastructure::adapters::{HttpLlmClient, HttpLlmClientConfig};
use novel_companion::infrastructure::init_logging;
use novel_companion::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, DbPool, SqliteChapterRepository,
    SqliteNovelRepository,
};

const CHAPTER_EXTENSIONS: [&str; 2] = ["md", "txt"];

/// Novel Companion 维护工具
#[derive(Parser)]
#[command(name = "companion-cli", version, about = "Novel Companion maintenance commands")]
struct Cli {
    /// 配置文件路径，默认读取 ./config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 从 JSON 文件导入小说元数据（对象或数组）
    ImportMetadata {
        #[arg(default_value = "data/novels/novel_meta_data.json")]
        path: PathBuf,
    },

    /// 用 LLM 分析目录中的章节文件（ch1.md, ch_02.txt, ...）
    AnalyzeChapters {
        /// 已导入的小说标题
        #[arg(long)]
        novel_title: String,

        /// 章节文件目录
        #[arg(long)]
        dir: PathBuf,

        /// 覆盖配置中的提示词模板
        #[arg(long)]
        prompt_template: Option<PathBuf>,
    },

    /// 导出全部小说元数据为 JSON
    ExportNovels { output: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config_from_path(cli.config.as_deref())
        .map_err(|e| anyhow!("Failed to load config: {}", e))?;
    init_logging(&config.log);

    let pool = open_database(&config).await?;
    let result = match cli.command {
        Commands::ImportMetadata { path } => import_metadata(&pool, path).await,
        Commands::AnalyzeChapters {
            novel_title,
            dir,
            prompt_template,
        } => analyze_chapters(&config, &pool, &novel_title, &dir, prompt_template).await,
        Commands::ExportNovels { output } => export_novels(&pool, &output).await,
    };

    pool.close().await;
    result
}

async fn open_database(config: &AppConfig) -> anyhow::Result<DbPool> {
    if let Some(parent) = Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let pool = create_pool(&DatabaseConfig::from(&config.database)).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

async fn import_metadata(pool: &DbPool, path: PathBuf) -> anyhow::Result<()> {
    let handler = ImportNovelMetadataHandler::new(Arc::new(SqliteNovelRepository::new(pool.clone())));
    let result = handler.handle(ImportNovelMetadata { path: path.clone() }).await?;

    println!(
        "Imported {} novels from {} ({} skipped)",
        result.imported.len(),
        path.display(),
        result.skipped
    );
    Ok(())
}

async fn analyze_chapters(
    config: &AppConfig,
    pool: &DbPool,
    novel_title: &str,
    dir: &Path,
    prompt_template: Option<PathBuf>,
) -> anyhow::Result<()> {
    let novel_repo = Arc::new(SqliteNovelRepository::new(pool.clone()));
    let novel = novel_repo
        .find_by_title(novel_title)
        .await?
        .ok_or_else(|| anyhow!("Novel not found: {}", novel_title))?;

    let files = collect_chapter_files(dir)
        .with_context(|| format!("Failed to read chapter directory {}", dir.display()))?;
    if files.is_empty() {
        println!("No chapter files found in {}", dir.display());
        return Ok(());
    }

    let llm = Arc::new(HttpLlmClient::new(HttpLlmClientConfig::from(&config.llm))?);
    let handler = AnalyzeChapterTextHandler::new(
        novel_repo,
        Arc::new(SqliteChapterRepository::new(pool.clone())),
        llm,
        config.llm.prompt_template_path.clone(),
    );

    let (mut analyzed, mut skipped, mut failed) = (0u32, 0u32, 0u32);
    for (chapter_number, path) in files {
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to read chapter file");
                failed += 1;
                continue;
            }
        };

        let command = AnalyzeChapterText {
            novel_id: novel.id,
            chapter_number,
            content,
            prompt_template: prompt_template.clone(),
        };

        match handler.handle(command).await {
            Ok(ChapterOutcome::Analyzed) => {
                println!("Chapter {}: analyzed", chapter_number);
                analyzed += 1;
            }
            Ok(ChapterOutcome::Skipped) => {
                println!("Chapter {}: already analyzed", chapter_number);
                skipped += 1;
            }
            Err(e) => {
                tracing::error!(
                    novel_id = %novel.id,
                    chapter_number,
                    error = %e,
                    "Chapter analysis failed"
                );
                failed += 1;
            }
        }
    }

    println!(
        "{}: {} analyzed, {} skipped, {} failed",
        novel.title, analyzed, skipped, failed
    );
    Ok(())
}

async fn export_novels(pool: &DbPool, output: &Path) -> anyhow::Result<()> {
    let handler = ExportNovelsHandler::new(Arc::new(SqliteNovelRepository::new(pool.clone())));
    let novels = handler.handle(ExportNovels).await?;

    let json = serde_json::to_string_pretty(&novels)?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(output, json)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Exported {} novels to {}", novels.len(), output.display());
    Ok(())
}

/// 目录中可识别章节号的 md/txt 文件，按章节号排序
fn collect_chapter_files(dir: &Path) -> std::io::Result<Vec<(u32, PathBuf)>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_chapter_file = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| CHAPTER_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)));
        if !path.is_file() || !is_chapter_file {
            continue;
        }

        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match chapter_number_from_file_stem(stem) {
            Some(number) => files.push((number, path)),
            None => tracing::warn!(path = %path.display(), "Skipping file without chapter number"),
        }
    }

    files.sort_by_key(|(number, _)| *number);
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_chapter_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["ch10.md", "ch_02.txt", "ch-1.md", "notes.md", "ch3.pdf", "chapter_04.md"] {
            std::fs::write(dir.path().join(name), "text").unwrap();
        }

        let files = collect_chapter_files(dir.path()).unwrap();
        let numbers: Vec<u32> = files.iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, vec![1, 2, 10]);
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "companion-cli",
            "analyze-chapters",
            "--novel-title",
            "Dune",
            "--dir",
            "chapters",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::AnalyzeChapters { ref novel_title, .. } if novel_title == "Dune"
        ));

        let cli = Cli::try_parse_from(["companion-cli", "import-metadata"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::ImportMetadata { ref path } if path.ends_with("novel_meta_data.json")
        ));
    }
}
