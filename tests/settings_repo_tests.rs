// SettingsRepo tests: connect, init, save, load, reset

use hostmon::models::{DisplaySettings, Visibility};
use hostmon::settings_repo::SettingsRepo;
use tempfile::TempDir;

async fn repo(dir: &TempDir) -> SettingsRepo {
    let path = dir.path().join("nested").join("settings.db");
    let repo = SettingsRepo::connect(path.to_str().unwrap(), 2)
        .await
        .unwrap();
    repo.init().await.unwrap();
    repo
}

#[tokio::test]
async fn settings_repo_connect_and_init() {
    let dir = TempDir::new().unwrap();
    let repo = repo(&dir).await;
    // init is idempotent
    repo.init().await.unwrap();
    assert!(dir.path().join("nested").join("settings.db").exists());
}

#[tokio::test]
async fn settings_repo_load_display_empty() {
    let dir = TempDir::new().unwrap();
    let repo = repo(&dir).await;
    assert_eq!(repo.load_display().await.unwrap(), None);
}

#[tokio::test]
async fn settings_repo_save_and_load_display() {
    let dir = TempDir::new().unwrap();
    let repo = repo(&dir).await;
    let settings = DisplaySettings {
        visibility: Visibility {
            show_group_cpu: false,
            ..Default::default()
        },
        update_interval: 1500,
    };
    repo.save_display(&settings).await.unwrap();
    assert_eq!(repo.load_display().await.unwrap(), Some(settings));

    // Overwrite keeps a single value.
    let updated = DisplaySettings::defaults(3000);
    repo.save_display(&updated).await.unwrap();
    assert_eq!(repo.load_display().await.unwrap(), Some(updated));
}

#[tokio::test]
async fn settings_repo_rejects_invalid_display() {
    let dir = TempDir::new().unwrap();
    let repo = repo(&dir).await;
    let err = repo
        .save_display(&DisplaySettings::defaults(10))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("updateInterval"));
    assert_eq!(repo.load_display().await.unwrap(), None);
}

#[tokio::test]
async fn settings_repo_reset_display() {
    let dir = TempDir::new().unwrap();
    let repo = repo(&dir).await;
    repo.save_display(&DisplaySettings::defaults(2000))
        .await
        .unwrap();
    repo.reset_display().await.unwrap();
    assert_eq!(repo.load_display().await.unwrap(), None);
    // Resetting twice is fine.
    repo.reset_display().await.unwrap();
}

#[tokio::test]
async fn settings_repo_status_bar_flag() {
    let dir = TempDir::new().unwrap();
    let repo = repo(&dir).await;
    assert!(repo.load_status_bar_enabled().await.unwrap());
    repo.save_status_bar_enabled(false).await.unwrap();
    assert!(!repo.load_status_bar_enabled().await.unwrap());
    // Display reset leaves the flag alone.
    repo.reset_display().await.unwrap();
    assert!(!repo.load_status_bar_enabled().await.unwrap());
}

#[tokio::test]
async fn settings_repo_persists_across_connections() {
    let dir = TempDir::new().unwrap();
    {
        let repo = repo(&dir).await;
        repo.save_display(&DisplaySettings::defaults(750))
            .await
            .unwrap();
    }
    let repo = repo(&dir).await;
    assert_eq!(
        repo.load_display().await.unwrap(),
        Some(DisplaySettings::defaults(750))
    );
}

#[tokio::test]
async fn settings_repo_stamps_updated_at_in_epoch_millis() {
    let dir = TempDir::new().unwrap();
    let repo = repo(&dir).await;
    let before = chrono::Utc::now().timestamp_millis();
    repo.save_status_bar_enabled(true).await.unwrap();
    let after = chrono::Utc::now().timestamp_millis();

    let path = dir.path().join("nested").join("settings.db");
    let pool = sqlx::SqlitePool::connect(&format!("sqlite://{}", path.display()))
        .await
        .unwrap();
    let updated_at: i64 =
        sqlx::query_scalar("SELECT updated_at FROM settings WHERE key = 'status_bar_enabled'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(before <= updated_at && updated_at <= after);
}
