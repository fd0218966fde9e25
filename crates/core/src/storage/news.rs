use crate::domain::market::NewsArticle;
use anyhow::Context;

/// Append-only insert keyed on the provider uuid; an article already stored
/// is never overwritten. Returns the number of rows that actually landed.
pub async fn insert_news_if_absent(
    pool: &sqlx::PgPool,
    articles: &[NewsArticle],
) -> anyhow::Result<u64> {
    let mut inserted: u64 = 0;

    for article in articles {
        let res = sqlx::query(
            "INSERT INTO news_articles (uuid, ticker, published_at, title, publisher, link, \
                 article_type, thumbnail_url, thumbnail_width, thumbnail_height) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (uuid) DO NOTHING",
        )
        .bind(&article.uuid)
        .bind(&article.ticker)
        .bind(article.published_at)
        .bind(&article.title)
        .bind(&article.publisher)
        .bind(&article.link)
        .bind(&article.article_type)
        .bind(&article.thumbnail_url)
        .bind(article.thumbnail_width)
        .bind(article.thumbnail_height)
        .execute(pool)
        .await
        .with_context(|| format!("insert news_articles failed (uuid={})", article.uuid))?;

        inserted += res.rows_affected();
    }

    Ok(inserted)
}
