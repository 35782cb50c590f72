use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_blog_tables::{Categories, Locations};

const CATEGORY_SLUG: &str = "general";
const LOCATION_NAME: &str = "Planet Earth";

/// A published starter category and location, so a fresh database can
/// accept posts before anything else is configured.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .exec_stmt(
                Query::insert()
                    .into_table(Categories::Table)
                    .columns([Categories::Title, Categories::Description, Categories::Slug])
                    .values_panic([
                        "General".into(),
                        "Everything that fits nowhere else.".into(),
                        CATEGORY_SLUG.into(),
                    ])
                    .on_conflict(OnConflict::column(Categories::Slug).do_nothing().to_owned())
                    .to_owned(),
            )
            .await?;

        let location_exists = Query::select()
            .expr(Expr::val(1))
            .from(Locations::Table)
            .and_where(Expr::col(Locations::Name).eq(LOCATION_NAME))
            .to_owned();
        manager
            .exec_stmt(
                Query::insert()
                    .into_table(Locations::Table)
                    .columns([Locations::Name])
                    .select_from(
                        Query::select()
                            .expr(Expr::val(LOCATION_NAME))
                            .and_where(Expr::exists(location_exists).not())
                            .to_owned(),
                    )
                    .map_err(|e| DbErr::Migration(e.to_string()))?
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        // Posts may reference the seeded rows by now; they stay.
        Ok(())
    }
}
