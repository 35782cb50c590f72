//! Category and location management.

use std::io::Write;

use clap::{Args, Subcommand};

use blogicum_core::domain::{Category, Id, Location};
use blogicum_core::error::RepoError;
use blogicum_core::forms::{SLUG_MAX_LEN, TITLE_MAX_LEN, is_valid_slug};
use blogicum_core::ports::{CategoryRepository, LocationRepository};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the categories posts are filed under.
    #[command(subcommand)]
    Category(CategoryCommand),

    /// Manage the locations posts may refer to.
    #[command(subcommand)]
    Location(LocationCommand),
}

#[derive(Debug, Subcommand)]
pub enum CategoryCommand {
    /// Create a category.
    Add(NewCategory),
    /// Print every category.
    List,
    /// Show a category and its posts again.
    Publish { slug: String },
    /// Hide a category; its page answers 404 and its posts leave listings.
    Hide { slug: String },
}

#[derive(Debug, Args)]
pub struct NewCategory {
    #[arg(long)]
    pub title: String,

    /// Latin letters, digits, hyphens and underscores.
    #[arg(long)]
    pub slug: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Create it unpublished.
    #[arg(long)]
    pub hidden: bool,
}

#[derive(Debug, Subcommand)]
pub enum LocationCommand {
    /// Create a location.
    Add {
        name: String,
        /// Create it unpublished.
        #[arg(long)]
        hidden: bool,
    },
    /// Print every location.
    List,
    /// Offer a location on the post form.
    Publish { id: Id },
    /// Stop offering a location on the post form.
    Hide { id: Id },
}

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("{0}")]
    Invalid(String),

    #[error("no category with slug '{0}'")]
    UnknownCategory(String),

    #[error("no location with id {0}")]
    UnknownLocation(Id),

    #[error("a category with slug '{0}' already exists")]
    DuplicateSlug(String),

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

pub async fn run(
    command: Command,
    categories: &dyn CategoryRepository,
    locations: &dyn LocationRepository,
    out: &mut impl Write,
) -> Result<(), AdminError> {
    match command {
        Command::Category(command) => run_category(command, categories, out).await,
        Command::Location(command) => run_location(command, locations, out).await,
    }
}

async fn run_category(
    command: CategoryCommand,
    categories: &dyn CategoryRepository,
    out: &mut impl Write,
) -> Result<(), AdminError> {
    match command {
        CategoryCommand::Add(new) => {
            let title = new.title.trim().to_string();
            let slug = new.slug.trim().to_string();
            if title.is_empty() || title.chars().count() > TITLE_MAX_LEN {
                return Err(AdminError::Invalid(format!(
                    "title must be 1 to {TITLE_MAX_LEN} characters"
                )));
            }
            if !is_valid_slug(&slug) {
                return Err(AdminError::Invalid(format!(
                    "slug must be 1 to {SLUG_MAX_LEN} latin letters, digits, '-' or '_'"
                )));
            }
            if categories.find_by_slug(&slug).await?.is_some() {
                return Err(AdminError::DuplicateSlug(slug));
            }

            let mut category = Category::new(title, new.description.trim().to_string(), slug);
            category.is_published = !new.hidden;
            let category = match categories.save(category).await {
                Err(RepoError::Constraint(_)) => return Err(AdminError::DuplicateSlug(new.slug)),
                other => other?,
            };
            tracing::info!(category_id = category.id, slug = %category.slug, "Category created");
            writeln!(out, "created category {} ({})", category.slug, category.id)?;
        }
        CategoryCommand::List => {
            for category in categories.list_all().await? {
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}",
                    category.id,
                    category.slug,
                    state(category.is_published),
                    category.title
                )?;
            }
        }
        CategoryCommand::Publish { slug } => set_category(categories, &slug, true, out).await?,
        CategoryCommand::Hide { slug } => set_category(categories, &slug, false, out).await?,
    }
    Ok(())
}

async fn set_category(
    categories: &dyn CategoryRepository,
    slug: &str,
    published: bool,
    out: &mut impl Write,
) -> Result<(), AdminError> {
    let mut category = categories
        .find_by_slug(slug)
        .await?
        .ok_or_else(|| AdminError::UnknownCategory(slug.to_string()))?;
    category.is_published = published;
    let category = categories.save(category).await?;
    tracing::info!(category_id = category.id, published, "Category updated");
    writeln!(out, "category {} is {}", category.slug, state(published))?;
    Ok(())
}

async fn run_location(
    command: LocationCommand,
    locations: &dyn LocationRepository,
    out: &mut impl Write,
) -> Result<(), AdminError> {
    match command {
        LocationCommand::Add { name, hidden } => {
            let name = name.trim().to_string();
            if name.is_empty() || name.chars().count() > TITLE_MAX_LEN {
                return Err(AdminError::Invalid(format!(
                    "name must be 1 to {TITLE_MAX_LEN} characters"
                )));
            }
            let mut location = Location::new(name);
            location.is_published = !hidden;
            let location = locations.save(location).await?;
            tracing::info!(location_id = location.id, "Location created");
            writeln!(out, "created location {} ({})", location.name, location.id)?;
        }
        LocationCommand::List => {
            for location in locations.list_all().await? {
                writeln!(
                    out,
                    "{}\t{}\t{}",
                    location.id,
                    state(location.is_published),
                    location.name
                )?;
            }
        }
        LocationCommand::Publish { id } => set_location(locations, id, true, out).await?,
        LocationCommand::Hide { id } => set_location(locations, id, false, out).await?,
    }
    Ok(())
}

async fn set_location(
    locations: &dyn LocationRepository,
    id: Id,
    published: bool,
    out: &mut impl Write,
) -> Result<(), AdminError> {
    let mut location = locations
        .find_by_id(id)
        .await?
        .ok_or(AdminError::UnknownLocation(id))?;
    location.is_published = published;
    let location = locations.save(location).await?;
    tracing::info!(location_id = location.id, published, "Location updated");
    writeln!(out, "location {} is {}", location.name, state(published))?;
    Ok(())
}

fn state(published: bool) -> &'static str {
    if published { "published" } else { "hidden" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blogicum_infra::InMemoryStore;

    async fn exec(store: &InMemoryStore, command: Command) -> Result<String, AdminError> {
        let mut out = Vec::new();
        run(command, store, store, &mut out).await?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn add_category(slug: &str) -> Command {
        Command::Category(CategoryCommand::Add(NewCategory {
            title: "Travel".into(),
            slug: slug.into(),
            description: "Trips".into(),
            hidden: false,
        }))
    }

    #[tokio::test]
    async fn test_category_is_created_and_listed() {
        let store = InMemoryStore::new();

        let out = exec(&store, add_category("travel")).await.unwrap();
        assert!(out.starts_with("created category travel"));

        let category = store.find_by_slug("travel").await.unwrap().unwrap();
        assert!(category.is_published);
        assert_eq!(category.description, "Trips");

        let out = exec(&store, Command::Category(CategoryCommand::List)).await.unwrap();
        assert!(out.contains("travel\tpublished\tTravel"));
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_rejected() {
        let store = InMemoryStore::new();
        exec(&store, add_category("travel")).await.unwrap();

        assert!(matches!(
            exec(&store, add_category("travel")).await,
            Err(AdminError::DuplicateSlug(_))
        ));
    }

    #[tokio::test]
    async fn test_bad_slug_is_rejected() {
        let store = InMemoryStore::new();
        assert!(matches!(
            exec(&store, add_category("no spaces")).await,
            Err(AdminError::Invalid(_))
        ));
        assert!(store.find_by_slug("no spaces").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_category_can_be_hidden_and_published() {
        let store = InMemoryStore::new();
        exec(&store, add_category("travel")).await.unwrap();

        exec(&store, Command::Category(CategoryCommand::Hide { slug: "travel".into() }))
            .await
            .unwrap();
        assert!(!store.find_by_slug("travel").await.unwrap().unwrap().is_published);

        exec(&store, Command::Category(CategoryCommand::Publish { slug: "travel".into() }))
            .await
            .unwrap();
        assert!(store.find_by_slug("travel").await.unwrap().unwrap().is_published);

        assert!(matches!(
            exec(&store, Command::Category(CategoryCommand::Hide { slug: "nope".into() })).await,
            Err(AdminError::UnknownCategory(_))
        ));
    }

    #[tokio::test]
    async fn test_hidden_location_leaves_post_form_choices() {
        let store = InMemoryStore::new();
        exec(
            &store,
            Command::Location(LocationCommand::Add {
                name: "Lisbon".into(),
                hidden: false,
            }),
        )
        .await
        .unwrap();
        let lisbon = store.list_published().await.unwrap().remove(0);

        exec(&store, Command::Location(LocationCommand::Hide { id: lisbon.id }))
            .await
            .unwrap();
        assert!(store.list_published().await.unwrap().is_empty());

        let out = exec(&store, Command::Location(LocationCommand::List)).await.unwrap();
        assert!(out.contains("hidden\tLisbon"));

        assert!(matches!(
            exec(&store, Command::Location(LocationCommand::Publish { id: 999 })).await,
            Err(AdminError::UnknownLocation(999))
        ));
    }
}
