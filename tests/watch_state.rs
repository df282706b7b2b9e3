//! Watch-state scenarios against a real Postgres
//!
//! Run with `DATABASE_URL` pointing at a server where the test user may create
//! databases, then `cargo test -- --ignored`.

use std::time::Duration;

use sqlx::PgPool;

use streaming_tracker::{
    db::Database,
    error::AppError,
    models::{AddShowRequest, CreateUserRequest, EditShowRequest, WatchStatus},
    services::{
        identity::{AccountService, IdentityService, UserService},
        search::SearchShowsOptions,
        ShowService, WatcherService,
    },
};

struct Fixture {
    shows: ShowService,
    watchers: WatcherService,
    account_id: i64,
    owner_id: i64,
    member_id: i64,
    owner_watcher: i64,
    member_watcher: i64,
    manual_watcher: i64,
}

async fn setup(pool: PgPool) -> Fixture {
    let db = Database::new(pool, Duration::from_secs(10), 2);
    let users = UserService::new(db.clone());
    let accounts = AccountService::new(db.clone());
    let watchers = WatcherService::new(db.clone());

    let mut owner = users
        .create_user(CreateUserRequest {
            email: "owner@example.com".to_string(),
            password: "owner-password".to_string(),
        })
        .await
        .unwrap();
    let account = accounts.create_account(owner.id, Some(owner.id)).await.unwrap();
    owner.account_id = Some(account.id);

    let mut member = users
        .create_user(CreateUserRequest {
            email: "member@example.com".to_string(),
            password: "member-password".to_string(),
        })
        .await
        .unwrap();
    users.add_user_to_account(member.id, account.id).await.unwrap();
    member.account_id = Some(account.id);

    let owner_watcher = watchers.create_watcher_for_user(&owner).await.unwrap();
    let member_watcher = watchers.create_watcher_for_user(&member).await.unwrap();
    let manual_watcher = watchers
        .create_watcher_manual(account.id, "Grandma")
        .await
        .unwrap();

    Fixture {
        shows: ShowService::new(db),
        watchers,
        account_id: account.id,
        owner_id: owner.id,
        member_id: member.id,
        owner_watcher: owner_watcher.id,
        member_watcher: member_watcher.id,
        manual_watcher: manual_watcher.id,
    }
}

fn new_show(name: &str, total_seasons: i32, watcher_ids: Vec<i64>) -> AddShowRequest {
    AddShowRequest {
        name: name.to_string(),
        total_seasons,
        platform_id: None,
        watcher_ids,
        poster_image: String::new(),
    }
}

async fn assert_finished_at_matches_status(f: &Fixture, show_id: i64) {
    let status = f.shows.get_show_status(f.account_id, show_id).await.unwrap();
    assert_eq!(
        status.finished_at.is_some(),
        status.watch_status() == Some(WatchStatus::Finished),
        "finished_at out of step with status {:?}",
        status
    );
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_single_season_show_lifecycle(pool: PgPool) {
    let f = setup(pool).await;

    let show_id = f
        .shows
        .add_show(f.account_id, new_show("Foo", 1, vec![f.owner_watcher]))
        .await
        .unwrap();

    let show = f.shows.get_show_by_id(f.account_id, show_id).await.unwrap();
    assert_eq!(show.num_seasons, 1);
    assert_eq!(show.watcher_ids, vec![f.owner_watcher]);
    assert!(show.finished_at.is_none());

    f.shows.start_watching(f.account_id, show_id).await.unwrap();
    let status = f.shows.get_show_status(f.account_id, show_id).await.unwrap();
    assert_eq!(status.current_season, 1);
    assert_eq!(status.watch_status(), Some(WatchStatus::Watching));

    f.shows.finish_season(f.account_id, show_id).await.unwrap();
    let status = f.shows.get_show_status(f.account_id, show_id).await.unwrap();
    assert_eq!(status.current_season, 1);
    assert_eq!(status.watch_status(), Some(WatchStatus::Finished));
    assert!(status.finished_at.is_some());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_concurrent_finishers_transition_once(pool: PgPool) {
    let f = setup(pool).await;

    let show_id = f
        .shows
        .add_show(f.account_id, new_show("Race", 1, vec![f.owner_watcher]))
        .await
        .unwrap();
    f.shows.start_watching(f.account_id, show_id).await.unwrap();

    let (first, second) = tokio::join!(
        f.shows.finish_season(f.account_id, show_id),
        f.shows.finish_season(f.account_id, show_id),
    );
    first.unwrap();
    second.unwrap();

    let finished_at = f
        .shows
        .get_show_status(f.account_id, show_id)
        .await
        .unwrap()
        .finished_at;

    f.shows.finish_season(f.account_id, show_id).await.unwrap();
    let status = f.shows.get_show_status(f.account_id, show_id).await.unwrap();
    assert_eq!(status.current_season, 1);
    assert_eq!(status.watch_status(), Some(WatchStatus::Finished));
    assert_eq!(status.finished_at, finished_at);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_finish_season_advances_until_last(pool: PgPool) {
    let f = setup(pool).await;

    let show_id = f
        .shows
        .add_show(f.account_id, new_show("Three", 3, vec![f.owner_watcher]))
        .await
        .unwrap();
    f.shows.start_watching(f.account_id, show_id).await.unwrap();

    f.shows.finish_season(f.account_id, show_id).await.unwrap();
    f.shows.finish_season(f.account_id, show_id).await.unwrap();
    let status = f.shows.get_show_status(f.account_id, show_id).await.unwrap();
    assert_eq!(status.current_season, 3);
    assert_eq!(status.watch_status(), Some(WatchStatus::Watching));
    assert_finished_at_matches_status(&f, show_id).await;

    f.shows.finish_season(f.account_id, show_id).await.unwrap();
    assert_finished_at_matches_status(&f, show_id).await;
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_add_season_grows_both_counters(pool: PgPool) {
    let f = setup(pool).await;

    let show_id = f
        .shows
        .add_show(f.account_id, new_show("Renewed", 1, vec![f.owner_watcher]))
        .await
        .unwrap();
    f.shows.start_watching(f.account_id, show_id).await.unwrap();
    f.shows.finish_season(f.account_id, show_id).await.unwrap();

    f.shows.add_season(f.account_id, show_id).await.unwrap();

    let show = f.shows.get_show_by_id(f.account_id, show_id).await.unwrap();
    let status = f.shows.get_show_status(f.account_id, show_id).await.unwrap();
    assert_eq!(show.num_seasons, 2);
    assert_eq!(status.current_season, 2);
    assert!(status.finished_at.is_none());
    assert_finished_at_matches_status(&f, show_id).await;

    f.shows.back_to_want_to_watch(f.account_id, show_id).await.unwrap();
    let status = f.shows.get_show_status(f.account_id, show_id).await.unwrap();
    assert_eq!(status.watch_status(), Some(WatchStatus::WantToWatch));
    assert_eq!(status.current_season, 2);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_add_season_while_watching_grows_both_counters(pool: PgPool) {
    let f = setup(pool).await;

    let show_id = f
        .shows
        .add_show(f.account_id, new_show("Mid Run", 3, vec![f.owner_watcher]))
        .await
        .unwrap();
    f.shows.start_watching(f.account_id, show_id).await.unwrap();
    f.shows.finish_season(f.account_id, show_id).await.unwrap();

    let before = f.shows.get_show_status(f.account_id, show_id).await.unwrap();
    assert_eq!(before.watch_status(), Some(WatchStatus::Watching));
    assert_eq!(before.current_season, 2);

    f.shows.add_season(f.account_id, show_id).await.unwrap();

    let show = f.shows.get_show_by_id(f.account_id, show_id).await.unwrap();
    let status = f.shows.get_show_status(f.account_id, show_id).await.unwrap();
    assert_eq!(show.num_seasons, 4);
    assert_eq!(status.current_season, 3);
    assert!(status.finished_at.is_none());
    assert_finished_at_matches_status(&f, show_id).await;
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_delete_refused_after_watching(pool: PgPool) {
    let f = setup(pool).await;

    let show_id = f
        .shows
        .add_show(f.account_id, new_show("Keeper", 2, vec![f.owner_watcher]))
        .await
        .unwrap();
    f.shows.start_watching(f.account_id, show_id).await.unwrap();

    let result = f.shows.delete_show(f.account_id, show_id).await;
    assert!(matches!(result, Err(AppError::ShowHasWatchedSeasons)));

    let show = f.shows.get_show_by_id(f.account_id, show_id).await.unwrap();
    assert_eq!(show.watcher_ids, vec![f.owner_watcher]);
    f.shows.get_show_status(f.account_id, show_id).await.unwrap();
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_delete_unwatched_show(pool: PgPool) {
    let f = setup(pool).await;

    let show_id = f
        .shows
        .add_show(f.account_id, new_show("Never Started", 2, vec![f.owner_watcher]))
        .await
        .unwrap();

    f.shows.delete_show(f.account_id, show_id).await.unwrap();

    assert!(matches!(
        f.shows.get_show_by_id(f.account_id, show_id).await,
        Err(AppError::ShowNotFound)
    ));
    assert!(matches!(
        f.shows.delete_show(f.account_id, show_id).await,
        Err(AppError::ShowNotFound)
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_cancelled_show_rejects_transitions(pool: PgPool) {
    let f = setup(pool).await;

    let show_id = f
        .shows
        .add_show(f.account_id, new_show("Axed", 2, vec![f.owner_watcher]))
        .await
        .unwrap();

    f.shows.cancel_show(f.account_id, show_id).await.unwrap();
    f.shows.cancel_show(f.account_id, show_id).await.unwrap();

    assert!(matches!(
        f.shows.start_watching(f.account_id, show_id).await,
        Err(AppError::ShowCancelled)
    ));
    assert!(matches!(
        f.shows.add_season(f.account_id, show_id).await,
        Err(AppError::ShowCancelled)
    ));
    assert!(matches!(
        f.shows.finish_season(f.account_id, show_id).await,
        Err(AppError::ShowCancelled)
    ));
    assert!(matches!(
        f.shows.back_to_want_to_watch(f.account_id, show_id).await,
        Err(AppError::ShowCancelled)
    ));
    assert!(matches!(
        f.shows
            .update_show(
                f.account_id,
                EditShowRequest {
                    id: show_id,
                    name: "Axed Renamed".to_string(),
                    total_seasons: 3,
                    platform_id: None,
                    watcher_ids: vec![f.member_watcher],
                    poster_image: String::new(),
                },
            )
            .await,
        Err(AppError::ShowCancelled)
    ));

    let show = f.shows.get_show_by_id(f.account_id, show_id).await.unwrap();
    assert!(show.cancelled);
    assert!(show.date_cancelled.is_some());
    assert_eq!(show.name, "Axed");
    assert_eq!(show.num_seasons, 2);
    assert_eq!(show.watcher_ids, vec![f.owner_watcher]);

    let status = f.shows.get_show_status(f.account_id, show_id).await.unwrap();
    assert_eq!(status.watch_status(), Some(WatchStatus::WantToWatch));
    assert_eq!(status.current_season, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_other_account_sees_show_as_missing(pool: PgPool) {
    let f = setup(pool).await;

    let show_id = f
        .shows
        .add_show(f.account_id, new_show("Private", 1, vec![f.owner_watcher]))
        .await
        .unwrap();

    let stranger_account = f.account_id + 1000;
    assert!(matches!(
        f.shows.start_watching(stranger_account, show_id).await,
        Err(AppError::ShowNotFound)
    ));
    assert!(matches!(
        f.shows.back_to_want_to_watch(stranger_account, show_id).await,
        Err(AppError::ShowNotFound)
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_update_show_replaces_watchers(pool: PgPool) {
    let f = setup(pool).await;

    let show_id = f
        .shows
        .add_show(f.account_id, new_show("Shared", 1, vec![f.owner_watcher]))
        .await
        .unwrap();

    f.shows
        .update_show(
            f.account_id,
            EditShowRequest {
                id: show_id,
                name: "Shared Renamed".to_string(),
                total_seasons: 4,
                platform_id: None,
                watcher_ids: vec![f.member_watcher, f.manual_watcher],
                poster_image: String::new(),
            },
        )
        .await
        .unwrap();

    let show = f.shows.get_show_by_id(f.account_id, show_id).await.unwrap();
    assert_eq!(show.name, "Shared Renamed");
    assert_eq!(show.num_seasons, 4);
    let mut expected = vec![f.member_watcher, f.manual_watcher];
    expected.sort();
    assert_eq!(show.watcher_ids, expected);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_add_show_with_foreign_watcher_rolls_back(pool: PgPool) {
    let f = setup(pool).await;

    let result = f
        .shows
        .add_show(f.account_id, new_show("Orphan", 1, vec![f.owner_watcher, 999_999]))
        .await;
    assert!(matches!(result, Err(AppError::WatcherNotFound)));

    let page = f
        .shows
        .search_shows(f.account_id, SearchShowsOptions::default().with_show_name("Orphan"))
        .await
        .unwrap();
    assert_eq!(page.total_count, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_active_groupings(pool: PgPool) {
    let f = setup(pool).await;

    let watching = f
        .shows
        .add_show(f.account_id, new_show("Bravo", 2, vec![f.owner_watcher, f.member_watcher]))
        .await
        .unwrap();
    f.shows
        .add_show(f.account_id, new_show("Alpha", 2, vec![f.owner_watcher]))
        .await
        .unwrap();
    f.shows.start_watching(f.account_id, watching).await.unwrap();

    let by_status = f
        .shows
        .get_active_shows_grouped_by_status_and_watchers(f.account_id)
        .await
        .unwrap();
    let statuses: Vec<&String> = by_status.keys().collect();
    assert_eq!(statuses, vec!["Watching", "Want to Watch"]);
    assert!(by_status["Watching"].contains_key("member@example.com, owner@example.com"));

    let by_watcher = f
        .shows
        .get_active_shows_grouped_by_watchers_and_status(f.account_id)
        .await
        .unwrap();
    let groups: Vec<&String> = by_watcher.keys().collect();
    assert_eq!(
        groups,
        vec!["member@example.com, owner@example.com", "owner@example.com"]
    );
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_search_paging(pool: PgPool) {
    let f = setup(pool).await;

    for name in ["Dark", "Dark Matter", "Darkwing Duck", "Lost"] {
        f.shows
            .add_show(f.account_id, new_show(name, 1, vec![f.owner_watcher]))
            .await
            .unwrap();
    }

    let filter = SearchShowsOptions::default().with_show_name("dark");

    let page_zero = f
        .shows
        .search_shows(f.account_id, filter.clone().with_page(0))
        .await
        .unwrap();
    let page_one = f
        .shows
        .search_shows(f.account_id, filter.clone().with_page(1))
        .await
        .unwrap();
    let page_two = f
        .shows
        .search_shows(f.account_id, filter.clone().with_page(2))
        .await
        .unwrap();

    let names = |rows: &[streaming_tracker::models::ShowRow]| {
        rows.iter().map(|r| r.show_name.clone()).collect::<Vec<_>>()
    };

    assert_eq!(names(&page_zero.items), names(&page_one.items));
    assert_eq!(names(&page_one.items), vec!["Dark", "Dark Matter"]);
    assert_eq!(names(&page_two.items), vec!["Darkwing Duck"]);
    assert_eq!(page_one.total_count, 3);
    assert_eq!(page_two.total_count, 3);
    assert_eq!(page_zero.page, 1);
    assert_eq!(page_one.num_pages(2), 2);

    let past_end = f
        .shows
        .search_shows(f.account_id, filter.clone().with_page(5))
        .await
        .unwrap();
    assert!(past_end.items.is_empty());
    assert_eq!(past_end.total_count, 3);
    assert_eq!(past_end.num_pages(2), 2);

    let unfiltered_far = f
        .shows
        .search_shows(f.account_id, SearchShowsOptions::default().with_page(i64::MAX))
        .await
        .unwrap();
    assert!(unfiltered_far.items.is_empty());
    assert_eq!(unfiltered_far.total_count, 4);

    let none = f
        .shows
        .search_shows(f.account_id, SearchShowsOptions::default().with_show_name("zzz"))
        .await
        .unwrap();
    assert!(none.items.is_empty());
    assert_eq!(none.total_count, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_watcher_rename_permissions(pool: PgPool) {
    let f = setup(pool).await;

    let denied = f
        .watchers
        .update_watcher_name(f.account_id, f.member_id, f.manual_watcher, "Nana")
        .await;
    assert!(matches!(denied, Err(AppError::PermissionDenied(_))));

    f.watchers
        .update_watcher_name(f.account_id, f.member_id, f.member_watcher, "Sam")
        .await
        .unwrap();

    f.watchers
        .update_watcher_name(f.account_id, f.owner_id, f.manual_watcher, "Nana")
        .await
        .unwrap();

    let listing = f
        .watchers
        .get_watchers_with_user_info(f.account_id, f.member_id)
        .await
        .unwrap();
    assert!(listing[0].is_owner);
    let editable: Vec<&str> = listing
        .iter()
        .filter(|w| w.can_edit)
        .map(|w| w.name.as_str())
        .collect();
    assert_eq!(editable, vec!["Sam"]);

    let names: Vec<String> = f
        .watchers
        .get_watchers(f.account_id)
        .await
        .unwrap()
        .into_iter()
        .map(|w| w.name)
        .collect();
    assert_eq!(names.len(), 3);
    assert!(names.contains(&"Nana".to_string()));
    assert!(names.contains(&"Sam".to_string()));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_repeated_verification_creates_one_account(pool: PgPool) {
    let db = Database::new(pool.clone(), Duration::from_secs(10), 2);
    let identity = IdentityService::new(
        UserService::new(db.clone()),
        AccountService::new(db.clone()),
        WatcherService::new(db),
    );

    let user = identity
        .users
        .create_user(CreateUserRequest {
            email: "newcomer@example.com".to_string(),
            password: "newcomer-password".to_string(),
        })
        .await
        .unwrap();
    let code = user.activation_code.clone().unwrap();

    let verified = identity.verify_account(&code, None).await.unwrap();
    assert!(verified.user.active);
    assert_eq!(verified.account.owner, user.id);

    assert!(matches!(
        identity.verify_account(&code, None).await,
        Err(AppError::ActivationCodeNotFound)
    ));

    let owned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE owner = $1")
        .bind(user.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(owned, 1);
}
