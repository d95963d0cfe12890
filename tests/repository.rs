//! Repository tests against a real database.
//!
//! Each test gets a fresh database with `./migrations` applied.

use cardcatalog_backend::config::TableNames;
use cardcatalog_backend::models::{Card, CardImage};
use cardcatalog_backend::query::{FilterField, FilterSpec, PageRequest};
use cardcatalog_backend::repository::{CardRepository, RepositoryError};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn repo(pool: PgPool) -> CardRepository {
    CardRepository::new(pool, TableNames::default())
}

fn image(n: i32) -> CardImage {
    CardImage {
        image_url: format!("https://img/{}.jpg", n),
        image_url_small: format!("https://img/small/{}.jpg", n),
    }
}

fn card(id: i32, name: &str, card_type: &str) -> Card {
    Card {
        id,
        card_name: name.to_string(),
        card_type: card_type.to_string(),
        description: String::new(),
        archetype: String::new(),
        atk: None,
        def: None,
        card_level: None,
        race: None,
        attribute: None,
        linkval: None,
        linkmarkers: Vec::new(),
        card_scale: None,
        card_images: vec![image(id)],
    }
}

fn monster(id: i32, name: &str, level: i32, atk: i32, def: i32) -> Card {
    Card {
        atk: Some(atk),
        def: Some(def),
        card_level: Some(level),
        race: Some("Spellcaster".to_string()),
        attribute: Some("DARK".to_string()),
        ..card(id, name, "Normal Monster")
    }
}

async fn seed(repo: &CardRepository) {
    let cards = vec![
        monster(46986414, "Dark Magician", 7, 2500, 2100),
        monster(38033121, "Dark Magician Girl", 6, 2000, 1700),
        Card {
            description: "Draw 2 cards.".to_string(),
            ..card(55144522, "Pot of Greed", "Spell Card")
        },
        card(12580477, "Raigeki", "Spell Card"),
        card(5318639, "Mystical Space Typhoon", "Quick-Play Spell Card"),
        Card {
            linkval: Some(3),
            linkmarkers: vec!["Top".into(), "Bottom-Left".into(), "Bottom-Right".into()],
            ..card(1861629, "Decode Talker", "Link Monster")
        },
        Card {
            linkval: Some(2),
            linkmarkers: vec!["Bottom-Left".into(), "Bottom-Right".into()],
            ..card(41999284, "Linkuriboh", "Link Monster")
        },
    ];
    for c in &cards {
        repo.add_card(c).await.unwrap();
    }
}

async fn image_rows(pool: &PgPool, card_id: i32) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM card_images WHERE card_id = $1")
        .bind(card_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Listing and filtering
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn exact_type_filter_does_not_prefix_match(pool: PgPool) {
    let repo = repo(pool);
    seed(&repo).await;

    let spec = FilterSpec::new().with(FilterField::CardType, "Spell Card");
    let cards = repo.get_cards(&spec, PageRequest::default()).await.unwrap();

    // "Quick-Play Spell Card" and any "Spell Card..." variant must not match.
    assert_eq!(cards.len(), 2);
    assert!(cards.iter().all(|c| c.card_type == "Spell Card"));

    let (count, fragment) = repo.get_count(&spec).await.unwrap();
    assert_eq!(count, 2);
    assert_eq!(fragment, "card_type=Spell+Card");
}

#[sqlx::test(migrations = "./migrations")]
async fn name_filter_matches_name_or_description_prefix(pool: PgPool) {
    let repo = repo(pool);
    seed(&repo).await;

    let spec = FilterSpec::new().with(FilterField::CardName, "dark magician");
    let cards = repo.get_cards(&spec, PageRequest::default()).await.unwrap();
    let names: Vec<_> = cards.iter().map(|c| c.card_name.as_str()).collect();
    assert_eq!(names, vec!["Dark Magician Girl", "Dark Magician"]);

    let spec = FilterSpec::new().with(FilterField::CardName, "draw");
    let cards = repo.get_cards(&spec, PageRequest::default()).await.unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].card_name, "Pot of Greed");
}

#[sqlx::test(migrations = "./migrations")]
async fn wildcards_in_values_match_literally(pool: PgPool) {
    let repo = repo(pool);
    seed(&repo).await;

    let spec = FilterSpec::new().with(FilterField::CardName, "%");
    let (count, _) = repo.get_count(&spec).await.unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn combined_filters_narrow_results(pool: PgPool) {
    let repo = repo(pool);
    seed(&repo).await;

    let spec = FilterSpec::new()
        .with(FilterField::Race, "spell")
        .with(FilterField::CardLevel, "7")
        .with(FilterField::Attribute, "DARK");
    let cards = repo.get_cards(&spec, PageRequest::default()).await.unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].id, 46986414);
    assert_eq!(cards[0].attribute.as_deref(), Some("DARK"));

    let (_, fragment) = repo.get_count(&spec).await.unwrap();
    assert_eq!(fragment, "card_level=7&attribute=DARK&race=spell");
}

#[sqlx::test(migrations = "./migrations")]
async fn linkmarker_filter_requires_every_marker(pool: PgPool) {
    let repo = repo(pool);
    seed(&repo).await;

    let both = FilterSpec::new().with(FilterField::Linkmarkers, "Bottom-Left,Bottom-Right");
    let (count, _) = repo.get_count(&both).await.unwrap();
    assert_eq!(count, 2);

    let top = FilterSpec::new().with(FilterField::Linkmarkers, "\"Top\",Bottom-Left");
    let cards = repo.get_cards(&top, PageRequest::default()).await.unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].card_name, "Decode Talker");
    assert_eq!(
        cards[0].linkmarkers,
        vec!["Top", "Bottom-Left", "Bottom-Right"]
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn unfiltered_listing_pages_by_id(pool: PgPool) {
    let repo = repo(pool);
    seed(&repo).await;

    let spec = FilterSpec::new();
    let (total, fragment) = repo.get_count(&spec).await.unwrap();
    assert_eq!(total, 7);
    assert!(fragment.is_empty());

    let first = repo
        .get_cards(&spec, PageRequest::clamped(Some(1), Some(3)))
        .await
        .unwrap();
    let second = repo
        .get_cards(&spec, PageRequest::clamped(Some(2), Some(3)))
        .await
        .unwrap();
    let third = repo
        .get_cards(&spec, PageRequest::clamped(Some(3), Some(3)))
        .await
        .unwrap();

    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 3);
    assert_eq!(third.len(), 1);

    let ids: Vec<i32> = first.iter().chain(&second).chain(&third).map(|c| c.id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

#[sqlx::test(migrations = "./migrations")]
async fn cards_without_images_have_empty_image_list(pool: PgPool) {
    let repo = repo(pool);
    let bare = Card {
        card_images: Vec::new(),
        ..card(1, "Token", "Token")
    };
    repo.add_card(&bare).await.unwrap();

    let found = repo.get_card_by_id(1).await.unwrap();
    assert!(found.card_images.is_empty());
}

// ---------------------------------------------------------------------------
// Single-card lookup and insert
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn card_round_trips_with_images_in_order(pool: PgPool) {
    let repo = repo(pool);
    let original = Card {
        card_images: vec![image(46986414), image(36996508), image(46986415)],
        ..monster(46986414, "Dark Magician", 7, 2500, 2100)
    };
    repo.add_card(&original).await.unwrap();

    let found = repo.get_card_by_id(46986414).await.unwrap();
    assert_eq!(found, original);
}

#[sqlx::test(migrations = "./migrations")]
async fn image_urls_with_commas_and_quotes_round_trip(pool: PgPool) {
    let repo = repo(pool);
    let original = Card {
        card_images: vec![
            CardImage {
                image_url: "https://cdn/w_100,h_100/a.png".to_string(),
                image_url_small: "https://cdn/small/a b.png".to_string(),
            },
            CardImage {
                image_url: r#"https://cdn/"quoted"\b.png"#.to_string(),
                image_url_small: "https://cdn/small/b.png".to_string(),
            },
        ],
        ..card(89631139, "Blue-Eyes White Dragon", "Normal Monster")
    };
    repo.add_card(&original).await.unwrap();

    let found = repo.get_card_by_id(89631139).await.unwrap();
    assert_eq!(found.card_images, original.card_images);
}

#[sqlx::test(migrations = "./migrations")]
async fn zero_stats_are_not_absent(pool: PgPool) {
    let repo = repo(pool);
    repo.add_card(&monster(40640057, "Kuriboh", 1, 300, 200)).await.unwrap();
    repo.add_card(&Card {
        atk: Some(0),
        def: Some(0),
        ..card(2, "Zero", "Effect Monster")
    })
    .await
    .unwrap();

    let zero = repo.get_card_by_id(2).await.unwrap();
    assert_eq!(zero.atk, Some(0));
    assert_eq!(zero.card_level, None);

    let (count, _) = repo
        .get_count(&FilterSpec::new().with(FilterField::Atk, "0"))
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn missing_card_is_not_found(pool: PgPool) {
    let repo = repo(pool);
    let err = repo.get_card_by_id(999).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound(999)));
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_insert_is_rejected_without_changes(pool: PgPool) {
    let repo = repo(pool.clone());
    repo.add_card(&card(10, "Original", "Spell Card")).await.unwrap();

    let duplicate = Card {
        card_images: vec![image(11), image(12)],
        ..card(10, "Impostor", "Trap Card")
    };
    let err = repo.add_card(&duplicate).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Duplicate(10)));

    let stored = repo.get_card_by_id(10).await.unwrap();
    assert_eq!(stored.card_name, "Original");
    assert_eq!(image_rows(&pool, 10).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn failed_image_insert_rolls_back_everything(pool: PgPool) {
    let repo = repo(pool.clone());

    let mut broken = card(77, "Half Written", "Spell Card");
    broken.card_images = vec![
        image(1),
        CardImage {
            image_url: String::new(),
            image_url_small: String::new(),
        },
        image(3),
    ];

    let err = repo.add_card(&broken).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Query(_)));

    assert!(matches!(
        repo.get_card_by_id(77).await,
        Err(RepositoryError::NotFound(77))
    ));
    assert_eq!(image_rows(&pool, 77).await, 0);
}
