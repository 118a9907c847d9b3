use chrono::Duration;
use quest_core::model::{LessonId, LevelRecord, UserId, UserStats};
use quest_core::time::fixed_now;
use storage::repository::{
    AccountRepository, Storage, StorageError, StoredAccount, UserStatsRepository,
};
use storage::sqlite::SqliteStore;

fn memory_url(name: &str) -> String {
    format!("sqlite:file:{name}?mode=memory&cache=shared")
}

async fn connect(name: &str) -> SqliteStore {
    SqliteStore::open(&memory_url(name)).await.expect("open")
}

fn account(email: &str, user: &str) -> StoredAccount {
    StoredAccount {
        email: email.into(),
        user_id: UserId::new(user).unwrap(),
        password_hash: "$2b$04$not-a-real-hash".into(),
    }
}

fn played_stats() -> UserStats {
    let mut stats = UserStats::new(fixed_now());
    stats.star_count = 2;
    stats.lives_remaining = 4;
    stats
        .level_progress
        .insert(LessonId::new("level-1").unwrap(), LevelRecord::answered(true));
    stats
        .level_progress
        .insert(LessonId::new("level-2").unwrap(), LevelRecord::answered(false));
    stats
}

#[tokio::test]
async fn sqlite_roundtrips_stats_document() {
    let repo = connect("memdb_stats_roundtrip").await;
    let uid = UserId::new("user-a").unwrap();

    assert!(repo.read_stats(&uid).await.unwrap().is_none());

    let stats = played_stats();
    repo.write_stats(&uid, &stats).await.unwrap();

    let fetched = repo.read_stats(&uid).await.unwrap().expect("stored");
    assert_eq!(fetched, stats);
    assert_eq!(fetched.completed_count(), 2);
}

#[tokio::test]
async fn sqlite_write_is_full_document_replace() {
    let repo = connect("memdb_stats_replace").await;
    let uid = UserId::new("user-b").unwrap();

    repo.write_stats(&uid, &played_stats()).await.unwrap();

    let mut reset = UserStats::new(fixed_now() + Duration::days(1));
    reset.star_count = 9;
    repo.write_stats(&uid, &reset).await.unwrap();

    let fetched = repo.read_stats(&uid).await.unwrap().unwrap();
    assert_eq!(fetched, reset);
    assert!(fetched.level_progress.is_empty());
}

#[tokio::test]
async fn sqlite_documents_are_isolated_per_user() {
    let repo = connect("memdb_stats_isolated").await;
    let a = UserId::new("user-a").unwrap();
    let b = UserId::new("user-b").unwrap();

    repo.write_stats(&a, &played_stats()).await.unwrap();
    assert!(repo.read_stats(&b).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_corrupt_document_surfaces_serialization_error() {
    let repo = connect("memdb_stats_corrupt").await;
    let raw = sqlx::SqlitePool::connect(&memory_url("memdb_stats_corrupt"))
        .await
        .unwrap();
    sqlx::query("INSERT INTO user_stats (user_id, document, updated_at) VALUES (?1, ?2, ?3)")
        .bind("user-c")
        .bind("{\"stars\": \"many\"}")
        .bind(fixed_now())
        .execute(&raw)
        .await
        .unwrap();

    let err = repo
        .read_stats(&UserId::new("user-c").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = connect("memdb_stats_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
}

#[tokio::test]
async fn storage_builder_wires_sqlite_backend() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage_builder?mode=memory&cache=shared")
        .await
        .expect("storage");
    let uid = UserId::new("user-d").unwrap();
    storage
        .user_stats
        .write_stats(&uid, &played_stats())
        .await
        .unwrap();
    let fetched = storage.user_stats.read_stats(&uid).await.unwrap().unwrap();
    assert_eq!(fetched.star_count, 2);

    storage
        .accounts
        .insert_account(&account("dee@example.com", "user-d"))
        .await
        .unwrap();
    assert!(
        storage
            .accounts
            .find_account("dee@example.com")
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn sqlite_accounts_roundtrip_and_reject_duplicates() {
    let repo = connect("memdb_accounts").await;
    assert!(repo.find_account("ana@example.com").await.unwrap().is_none());

    let ana = account("ana@example.com", "user-ana");
    repo.insert_account(&ana).await.unwrap();
    assert_eq!(repo.find_account("ana@example.com").await.unwrap(), Some(ana));

    let same_email = account("ana@example.com", "user-other");
    assert!(matches!(
        repo.insert_account(&same_email).await,
        Err(StorageError::Conflict(_))
    ));
    let same_user = account("bo@example.com", "user-ana");
    assert!(matches!(
        repo.insert_account(&same_user).await,
        Err(StorageError::Conflict(_))
    ));
}

#[tokio::test]
async fn sqlite_accounts_are_visible_to_a_second_store() {
    let url = memory_url("memdb_accounts_reopen");
    let first = SqliteStore::open(&url).await.unwrap();
    first
        .insert_account(&account("cy@example.com", "user-cy"))
        .await
        .unwrap();

    let second = SqliteStore::open(&url).await.unwrap();
    let found = second.find_account("cy@example.com").await.unwrap().unwrap();
    assert_eq!(found.user_id.as_str(), "user-cy");
}
