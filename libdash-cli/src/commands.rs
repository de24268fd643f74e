use crate::args::{AuthorCommand, BookCommand, BookQuery, Cli, Commands};
use anyhow::{bail, Context, Result};
use core_library::render::render_books;
use core_library::{AuthorDraft, AuthorId, BookDraft, BookId, BookPatch, UserId, ViewMode};
use core_runtime::logging::{init_logging, LoggingConfig};
use core_service::{
    ActionKind, Dashboard, DashboardBuilder, DispatchOutcome, Message, MutationReport,
    Presentation, Section, SignupRequest,
};
use std::time::Duration;
use tracing::debug;

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(
        LoggingConfig::default()
            .with_level(cli.log_level)
            .with_format(cli.log_format),
    )?;

    let dashboard = connect(cli.api_url, cli.timeout)?;
    let mut events = dashboard.subscribe();

    let result = execute(&dashboard, cli.command).await;

    for event in events.drain() {
        debug!(severity = ?event.severity(), ?event, "{}", event.description());
    }
    result
}

fn connect(api_url: Option<String>, timeout: Option<u64>) -> Result<Dashboard> {
    let mut builder = DashboardBuilder::from_env()?;
    if let Some(url) = api_url {
        builder = builder.api_base_url(url);
    }
    if let Some(secs) = timeout {
        builder = builder.request_timeout(Duration::from_secs(secs));
    }
    let dashboard = builder.build()?;
    debug!(api = dashboard.api_base_url(), "Connected");
    Ok(dashboard)
}

async fn execute(dash: &Dashboard, command: Commands) -> Result<()> {
    match command {
        Commands::Login { email, password } => {
            let user = dash.login(&email, &password).await?;
            println!("Signed in as {} ({})", user.name, user.role);
        }
        Commands::Signup {
            name,
            email,
            password,
            role,
        } => {
            let message = dash
                .signup(SignupRequest::new(name, email, password, role))
                .await?;
            println!("{}", message);
        }
        Commands::Logout => {
            dash.logout().await?;
            println!("Signed out");
        }
        Commands::Whoami => match dash.current_user().await? {
            Some(user) => println!("{} <{}> ({})", user.name, user.email, user.role),
            None => println!("Not signed in"),
        },
        Commands::Books(query) => {
            let narrowed = query.narrows();
            apply_query(dash, query).await;
            if narrowed {
                search(dash).await?;
            } else {
                show(dash, Section::Books).await?;
            }
        }
        Commands::Book { command } => book(dash, command).await?,
        Commands::Issued => show(dash, Section::Issued).await?,
        Commands::Users => show(dash, Section::Users).await?,
        Commands::UserIssues { user_id } => {
            let (owner, view) = dash.user_issues(UserId(user_id)).await?;
            let name = owner
                .map(|user| user.name)
                .unwrap_or_else(|| format!("User {}", user_id));
            println!("{}'s Issued Books\n", name);
            println!("{}", view);
        }
        Commands::Authors { command } => authors(dash, command).await?,
    }
    Ok(())
}

async fn apply_query(dash: &Dashboard, query: BookQuery) {
    let messages = [
        Message::SetTitleFilter(query.title.unwrap_or_default()),
        Message::SetAuthorFilter(query.author.unwrap_or_default()),
        Message::SetCategoryFilter(query.category.unwrap_or_default()),
        Message::SetStatusFilter(query.status),
        Message::SetSort(query.sort),
        Message::SetViewMode(query.view),
    ];
    for message in messages {
        dash.send(message).await;
    }
}

/// Load `section` and print it. A failed load reports what the section
/// would show in its place.
async fn show(dash: &Dashboard, section: Section) -> Result<()> {
    let view = dash.open(section).await;
    print_section(dash, section, view).await
}

/// Books narrowed by the server's search endpoint, then by the local filters.
async fn search(dash: &Dashboard) -> Result<()> {
    let view = dash.search_books().await;
    print_section(dash, Section::Books, view).await
}

async fn print_section(
    dash: &Dashboard,
    section: Section,
    loaded: core_service::Result<Presentation>,
) -> Result<()> {
    let view = match loaded {
        Ok(view) => view,
        Err(e) if e.is_unauthenticated() => return Err(e.into()),
        Err(e) => {
            debug!(error = %e, %section, "Load failed");
            match dash.presentation().await {
                Presentation::Error { message } => bail!(message),
                _ => return Err(e.into()),
            }
        }
    };

    println!("{}\n", section);
    println!("{}", view);
    Ok(())
}

async fn book(dash: &Dashboard, command: BookCommand) -> Result<()> {
    let (kind, id) = match command {
        BookCommand::Add {
            title,
            category,
            author_id,
            isbn,
            status,
            description,
        } => {
            let mut draft = BookDraft::new(title, category, AuthorId(author_id), isbn);
            if let Some(status) = status {
                draft = draft.with_status(status);
            }
            if let Some(description) = description {
                draft = draft.with_description(description);
            }
            report(&dash.add_book(draft).await?);
            return Ok(());
        }
        BookCommand::Edit {
            id,
            title,
            category,
            author_id,
            isbn,
            status,
            description,
        } => {
            let patch = BookPatch {
                title,
                category,
                author_id: author_id.map(AuthorId),
                isbn,
                status,
                description,
            };
            dash.refresh_books().await?;
            let outcome = dash
                .edit_book(BookId(id), patch)
                .await?
                .with_context(|| format!("Book {} not found", id))?;
            report(&outcome);
            return Ok(());
        }
        BookCommand::Show { id } => (ActionKind::View, id),
        BookCommand::Issue { id } => (ActionKind::Issue, id),
        BookCommand::Return { id } => (ActionKind::Return, id),
        BookCommand::Delete { id } => (ActionKind::Delete, id),
    };

    // Row actions go through the rendered book list, as in the dashboard.
    dash.open(Section::Books).await?;
    match dash.dispatch(kind, BookId(id)).await? {
        Some(DispatchOutcome::Details(book)) => {
            println!("{}", render_books(ViewMode::List, std::slice::from_ref(&book)));
        }
        Some(DispatchOutcome::Mutated(outcome)) => report(&outcome),
        None => match kind {
            ActionKind::Issue => bail!("Book {} not found or already issued", id),
            ActionKind::Return => bail!("Book {} not found or not issued", id),
            ActionKind::View | ActionKind::Delete => bail!("Book {} not found", id),
        },
    }
    Ok(())
}

async fn authors(dash: &Dashboard, command: AuthorCommand) -> Result<()> {
    match command {
        AuthorCommand::List => show(dash, Section::Authors).await?,
        AuthorCommand::Add { name, bio } => {
            report(&dash.add_author(AuthorDraft::new(name, bio)).await?);
        }
        AuthorCommand::Edit { id, name, bio } => {
            dash.refresh_authors().await?;
            let outcome = dash
                .edit_author(AuthorId(id), AuthorDraft::new(name, bio))
                .await?
                .with_context(|| format!("Author {} not found", id))?;
            report(&outcome);
        }
        AuthorCommand::Delete { id } => {
            dash.refresh_authors().await?;
            let outcome = dash
                .delete_author(AuthorId(id))
                .await?
                .with_context(|| format!("Author {} not found", id))?;
            report(&outcome);
        }
    }
    Ok(())
}

fn report(outcome: &MutationReport) {
    println!("{}", outcome.summary());
    if let Some(error) = outcome.reload.error() {
        eprintln!("Warning: refreshing the list failed: {}", error);
    }
}
