//! 端到端用例：内存 SQLite + Fake LLM

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;
use uuid::Uuid;

use novel_companion::application::{
    AnalyzeNovelChapters, AnalyzeNovelChaptersHandler, ApplicationError, ChapterRepositoryPort,
    ChatAboutNovel, ChatAboutNovelHandler, ChatHistoryRepositoryPort, CreateNovel,
    CreateNovelHandler, ExportNovels, ExportNovelsHandler, GetCharacters, GetCharactersHandler,
    ImportNovelMetadata, ImportNovelMetadataHandler, NovelRepositoryPort, NovelStatus,
    ProcessNovelChapters, ProcessNovelChaptersHandler, SilentProgress, SummarizeChapter,
    SummarizeChapterHandler,
};
use novel_companion::domain::analysis::TextAnalyzer;
use novel_companion::domain::novel::SummaryLength;
use novel_companion::infrastructure::adapters::FakeLlmClient;
use novel_companion::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteChapterRepository,
    SqliteCharacterRepository, SqliteChatHistoryRepository, SqliteNovelRepository,
};

struct Repos {
    novels: Arc<SqliteNovelRepository>,
    chapters: Arc<SqliteChapterRepository>,
    characters: Arc<SqliteCharacterRepository>,
    chats: Arc<SqliteChatHistoryRepository>,
}

async fn repos() -> Repos {
    let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
    run_migrations(&pool).await.unwrap();

    Repos {
        novels: Arc::new(SqliteNovelRepository::new(pool.clone())),
        chapters: Arc::new(SqliteChapterRepository::new(pool.clone())),
        characters: Arc::new(SqliteCharacterRepository::new(pool.clone())),
        chats: Arc::new(SqliteChatHistoryRepository::new(pool)),
    }
}

fn manuscript() -> String {
    let mut text = String::new();
    for n in 1..=3 {
        text.push_str(&format!("Chapter {}\n", n));
        for _ in 0..3 {
            text.push_str("Alice met Bob at the harbor and they argued about the storm. ");
        }
        text.push_str("\n\n");
    }
    text
}

/// 创建并分章，返回小说 ID
async fn create_processed_novel(repos: &Repos) -> Uuid {
    let created = CreateNovelHandler::new(repos.novels.clone())
        .handle(CreateNovel {
            title: "Harbor Tales".into(),
            author: Some("Anon".into()),
            description: None,
            content: manuscript(),
        })
        .await
        .unwrap();
    assert_eq!(created.status, NovelStatus::Processing);

    let processed = ProcessNovelChaptersHandler::new(
        repos.novels.clone(),
        repos.chapters.clone(),
        repos.characters.clone(),
        Arc::new(TextAnalyzer::default()),
    )
    .handle(ProcessNovelChapters {
        novel_id: created.id,
        content: manuscript(),
    })
    .await
    .unwrap();
    assert_eq!(processed.total_chapters, 3);

    created.id
}

fn template_file(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("prompt_template.txt");
    std::fs::write(&path, "Analyze chapter {{chapter_number}} of {{novel_title}}.").unwrap();
    path
}

#[tokio::test]
async fn create_and_process_builds_chapters_and_characters() {
    let repos = repos().await;
    let novel_id = create_processed_novel(&repos).await;

    let novel = repos.novels.find_by_id(novel_id).await.unwrap().unwrap();
    assert_eq!(novel.status, NovelStatus::Ready);
    assert_eq!(novel.total_chapters, 3);

    let chapters = repos.chapters.find_all_by_novel(novel_id).await.unwrap();
    let numbers: Vec<u32> = chapters.iter().map(|c| c.chapter_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert!(chapters.iter().all(|c| c.word_count > 0 && !c.is_processed));

    let characters = GetCharactersHandler::new(repos.novels.clone(), repos.characters.clone())
        .handle(GetCharacters { novel_id })
        .await
        .unwrap();
    let alice = characters.iter().find(|c| c.name == "Alice").unwrap();
    assert_eq!(alice.first_appearance_chapter, Some(1));
    assert_eq!(alice.last_appearance_chapter, Some(3));
}

#[tokio::test]
async fn summary_reply_without_json_is_kept_as_text() {
    let repos = repos().await;
    let novel_id = create_processed_novel(&repos).await;
    let chapter = repos.chapters.find_by_number(novel_id, 2).await.unwrap().unwrap();

    let llm = Arc::new(FakeLlmClient::new(["Alice and Bob quarrel at the harbor."]));
    let response = SummarizeChapterHandler::new(repos.chapters.clone(), llm, 4000)
        .handle(SummarizeChapter {
            chapter_id: chapter.id,
            summary_length: SummaryLength::Short,
        })
        .await
        .unwrap();

    assert_eq!(response.summary, "Alice and Bob quarrel at the harbor.");
    assert!(response.key_events.is_empty());

    let stored = repos.chapters.find_by_id(chapter.id).await.unwrap().unwrap();
    assert_eq!(stored.summary.as_deref(), Some("Alice and Bob quarrel at the harbor."));
}

#[tokio::test]
async fn batch_analysis_reports_analyzed_skipped_and_failed() {
    let repos = repos().await;
    let novel_id = create_processed_novel(&repos).await;
    let dir = tempfile::tempdir().unwrap();

    let payload = json!({
        "chapter_analysis": {
            "summary": {"concise": "A storm is coming.", "key_events": ["argument"]},
            "themes": [{"theme": "weather"}]
        },
        "character_mapping": {"characters": [{"name": "Alice"}]}
    });
    let llm = Arc::new(FakeLlmClient::new([
        format!("Here you go:\n```json\n{}\n```", payload),
        "no json at all".to_string(),
        payload.to_string(),
    ]));

    let handler = AnalyzeNovelChaptersHandler::new(
        repos.novels.clone(),
        repos.chapters.clone(),
        llm,
        Arc::new(SilentProgress),
        template_file(&dir),
    );

    let report = handler
        .handle(AnalyzeNovelChapters {
            novel_id,
            force: false,
            prompt_template: None,
        })
        .await
        .unwrap();
    assert_eq!((report.analyzed, report.skipped, report.failed), (2, 0, 1));

    let first = repos.chapters.find_by_number(novel_id, 1).await.unwrap().unwrap();
    assert!(first.is_processed);
    assert_eq!(first.summary.as_deref(), Some("A storm is coming."));
    assert_eq!(first.themes, vec!["weather"]);
    assert_eq!(first.characters_mentioned, vec!["Alice"]);

    // 第二次只补分析失败的章节
    let report = handler
        .handle(AnalyzeNovelChapters {
            novel_id,
            force: false,
            prompt_template: None,
        })
        .await
        .unwrap();
    assert_eq!((report.analyzed, report.skipped, report.failed), (1, 2, 0));
}

#[tokio::test]
async fn analysis_requires_template_file() {
    let repos = repos().await;
    let novel_id = create_processed_novel(&repos).await;

    let handler = AnalyzeNovelChaptersHandler::new(
        repos.novels.clone(),
        repos.chapters.clone(),
        Arc::new(FakeLlmClient::new(["{}"])),
        Arc::new(SilentProgress),
        PathBuf::from("/nonexistent/prompt_template.txt"),
    );

    let result = handler
        .handle(AnalyzeNovelChapters {
            novel_id,
            force: true,
            prompt_template: None,
        })
        .await;
    assert!(matches!(result, Err(ApplicationError::StorageError(_))));
}

#[tokio::test]
async fn chat_is_persisted_and_fed_back_as_history() {
    let repos = repos().await;
    let novel_id = create_processed_novel(&repos).await;

    let llm = Arc::new(FakeLlmClient::new(["Alice.", "Bob."]));
    let handler = ChatAboutNovelHandler::new(
        repos.novels.clone(),
        repos.chapters.clone(),
        repos.chats.clone(),
        llm.clone(),
    );

    let first = handler
        .handle(ChatAboutNovel {
            novel_id,
            message: "Who is at the harbor?".into(),
        })
        .await
        .unwrap();
    assert_eq!(first.response, "Alice.");

    handler
        .handle(ChatAboutNovel {
            novel_id,
            message: "And who else?".into(),
        })
        .await
        .unwrap();

    let history = repos.chats.find_recent(novel_id, 10).await.unwrap();
    assert_eq!(history.len(), 2);

    // 第二次请求带上了第一轮问答
    let requests = llm.requests();
    assert!(requests[0].messages.len() < requests[1].messages.len());
}

#[tokio::test]
async fn chat_rejects_empty_message() {
    let repos = repos().await;
    let novel_id = create_processed_novel(&repos).await;

    let result = ChatAboutNovelHandler::new(
        repos.novels.clone(),
        repos.chapters.clone(),
        repos.chats.clone(),
        Arc::new(FakeLlmClient::new(["unused"])),
    )
    .handle(ChatAboutNovel {
        novel_id,
        message: "   ".into(),
    })
    .await;

    assert!(matches!(result, Err(ApplicationError::ValidationError(_))));
}

#[tokio::test]
async fn import_then_export_metadata() {
    let repos = repos().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("novel_meta_data.json");
    std::fs::write(
        &path,
        json!([
            {"title": "Omniscient Reader", "author": "sing N song", "genres": ["Fantasy"],
             "averageRating": 4.8, "voteCount": 1200, "statusInCOO": "Completed"},
            {"author": "missing title"},
            {"title": "Solo Leveling", "tags": ["Dungeons"]}
        ])
        .to_string(),
    )
    .unwrap();

    let imported = ImportNovelMetadataHandler::new(repos.novels.clone())
        .handle(ImportNovelMetadata { path })
        .await
        .unwrap();
    assert_eq!(imported.imported.len(), 2);
    assert_eq!(imported.skipped, 1);

    let exported = ExportNovelsHandler::new(repos.novels.clone())
        .handle(ExportNovels)
        .await
        .unwrap();
    assert_eq!(exported.len(), 2);

    let value = serde_json::to_value(&exported).unwrap();
    let reader = value
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["title"] == "Omniscient Reader")
        .unwrap();
    assert_eq!(reader["average_rating"], 4.8);
    assert_eq!(reader["status_in_coo"], "Completed");
    assert!(reader["_id"].is_string());
}
