use sqlx::{
    postgres::{PgArguments, PgRow},
    query::Query,
    PgPool, Postgres, Row,
};

use crate::{
    config::TableNames,
    models::Card,
    query::{array_text, build, build_by_id, BindValue, FilterSpec, PageRequest, StatementMode},
};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Card {0} not found")]
    NotFound(i32),

    #[error("Card {0} already exists")]
    Duplicate(i32),

    #[error("Query failed: {0}")]
    Query(#[from] sqlx::Error),
}

pub type RepoResult<T> = std::result::Result<T, RepositoryError>;

/// Card storage over a shared connection pool. Cheap to clone; holds no state
/// besides the pool handle and the configured table names.
#[derive(Debug, Clone)]
pub struct CardRepository {
    pool: PgPool,
    tables: TableNames,
}

impl CardRepository {
    pub fn new(pool: PgPool, tables: TableNames) -> Self {
        Self { pool, tables }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn tables(&self) -> &TableNames {
        &self.tables
    }

    /// Number of cards matching `spec`, plus the link fragment describing it.
    pub async fn get_count(&self, spec: &FilterSpec) -> RepoResult<(i64, String)> {
        let plan = build(spec, &self.tables, StatementMode::Count);
        tracing::debug!(sql = %plan.sql, params = plan.params.len(), "count query");

        let row = bind_params(sqlx::query(&plan.sql), &plan.params)
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.try_get(0)?;

        Ok((count, plan.url_fragment))
    }

    /// One page of cards matching `spec`, with their images, ordered by id.
    pub async fn get_cards(&self, spec: &FilterSpec, page: PageRequest) -> RepoResult<Vec<Card>> {
        let plan = build(
            spec,
            &self.tables,
            StatementMode::List {
                limit: page.limit(),
                offset: page.offset(),
            },
        );
        tracing::debug!(sql = %plan.sql, params = plan.params.len(), "list query");

        let rows = bind_params(sqlx::query(&plan.sql), &plan.params)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(card_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(RepositoryError::from)
    }

    pub async fn get_card_by_id(&self, id: i32) -> RepoResult<Card> {
        let plan = build_by_id(&self.tables, id);

        let row = bind_params(sqlx::query(&plan.sql), &plan.params)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound(id))?;

        Ok(card_from_row(&row)?)
    }

    /// Insert a card and all of its images in one transaction. Nothing is written
    /// unless every statement succeeds.
    pub async fn add_card(&self, card: &Card) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;

        let insert_card = format!(
            "INSERT INTO {} \
                (id, card_name, card_type, description, archetype, atk, def, card_level, \
                 race, attr, linkval, linkmarkers, card_scale) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
            self.tables.cards
        );
        sqlx::query(&insert_card)
            .bind(card.id)
            .bind(&card.card_name)
            .bind(&card.card_type)
            .bind(&card.description)
            .bind(&card.archetype)
            .bind(card.atk)
            .bind(card.def)
            .bind(card.card_level)
            .bind(&card.race)
            .bind(&card.attribute)
            .bind(card.linkval)
            .bind(&card.linkmarkers)
            .bind(card.card_scale)
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                if let sqlx::Error::Database(db) = &err {
                    if db.is_unique_violation() {
                        return RepositoryError::Duplicate(card.id);
                    }
                }
                RepositoryError::Query(err)
            })?;

        let insert_image = format!(
            "INSERT INTO {} (card_id, image_url, image_url_small) VALUES ($1, $2, $3)",
            self.tables.images
        );
        for image in &card.card_images {
            sqlx::query(&insert_image)
                .bind(card.id)
                .bind(&image.image_url)
                .bind(&image.image_url_small)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::debug!(card_id = card.id, images = card.card_images.len(), "card inserted");
        Ok(())
    }

    pub async fn ping(&self) -> RepoResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[BindValue],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            BindValue::Int(value) => query.bind(*value),
            BindValue::BigInt(value) => query.bind(*value),
            BindValue::Text(value) => query.bind(value.clone()),
            BindValue::TextArray(values) => query.bind(values.clone()),
        };
    }
    query
}

fn card_from_row(row: &PgRow) -> Result<Card, sqlx::Error> {
    let image_url: Option<String> = row.try_get("image_url")?;
    let image_url_small: Option<String> = row.try_get("image_url_small")?;
    let linkmarkers: Option<Vec<String>> = row.try_get("linkmarkers")?;

    Ok(Card {
        id: row.try_get("id")?,
        card_name: row.try_get("card_name")?,
        card_type: row.try_get("card_type")?,
        description: row.try_get("description")?,
        archetype: row.try_get("archetype")?,
        atk: row.try_get("atk")?,
        def: row.try_get("def")?,
        card_level: row.try_get("card_level")?,
        race: row.try_get("race")?,
        attribute: row.try_get("attr")?,
        linkval: row.try_get("linkval")?,
        linkmarkers: linkmarkers.unwrap_or_default(),
        card_scale: row.try_get("card_scale")?,
        card_images: Card::pair_images(
            array_text::decode(image_url.as_deref().unwrap_or_default()),
            array_text::decode(image_url_small.as_deref().unwrap_or_default()),
        ),
    })
}
