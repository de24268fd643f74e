use clap::{Args, Parser, Subcommand};
use core_library::{BookStatus, SortKey, StatusFilter, ViewMode};
use core_runtime::logging::{LogFormat, LogLevel};
use core_service::Role;

#[derive(Parser, Debug)]
#[command(name = "libdash")]
#[command(about = "Manage the library catalogue from the terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Backend address; overrides LIBDASH_API_URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Per-request timeout in seconds; overrides LIBDASH_TIMEOUT_SECS
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[arg(long, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    #[arg(long, default_value = "compact", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the session
    Login {
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Create an account (does not sign in)
    Signup {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        #[arg(long, default_value = "user")]
        role: Role,
    },

    Logout,

    /// Show the signed-in account
    Whoami,

    /// List books
    Books(BookQuery),

    Book {
        #[command(subcommand)]
        command: BookCommand,
    },

    /// List all loans
    Issued,

    Users,

    /// List one user's loans
    UserIssues { user_id: i64 },

    Authors {
        #[command(subcommand)]
        command: AuthorCommand,
    },
}

#[derive(Args, Debug)]
pub struct BookQuery {
    /// Case-insensitive title substring
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub author: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    /// all, available or issued
    #[arg(long, default_value = "all")]
    pub status: StatusFilter,

    /// title, title-desc, author, category or status
    #[arg(long, value_parser = parse_sort)]
    pub sort: Option<SortKey>,

    /// list or table (table shows available books only)
    #[arg(long, default_value = "list")]
    pub view: ViewMode,
}

impl BookQuery {
    /// Whether the server should narrow the listing before local filtering.
    pub fn narrows(&self) -> bool {
        let given = |value: &Option<String>| {
            value.as_deref().is_some_and(|v| !v.trim().is_empty())
        };
        given(&self.title)
            || given(&self.author)
            || given(&self.category)
            || self.status != StatusFilter::All
    }
}

#[derive(Subcommand, Debug)]
pub enum BookCommand {
    Show { id: i64 },

    Add {
        #[arg(long)]
        title: String,

        #[arg(long)]
        category: String,

        #[arg(long)]
        author_id: i64,

        #[arg(long)]
        isbn: String,

        #[arg(long)]
        status: Option<BookStatus>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Change the given fields only
    Edit {
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        author_id: Option<i64>,

        #[arg(long)]
        isbn: Option<String>,

        #[arg(long)]
        status: Option<BookStatus>,

        #[arg(long)]
        description: Option<String>,
    },

    Issue { id: i64 },

    Return { id: i64 },

    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum AuthorCommand {
    List,

    Add {
        name: String,

        #[arg(long)]
        bio: Option<String>,
    },

    Edit {
        id: i64,

        #[arg(long)]
        name: String,

        #[arg(long)]
        bio: Option<String>,
    },

    Delete { id: i64 },
}

fn parse_sort(value: &str) -> Result<SortKey, String> {
    SortKey::parse(value).ok_or_else(|| {
        let known: Vec<&str> = SortKey::ALL.iter().map(|k| k.as_str()).collect();
        format!("unknown sort key '{}' (expected one of {})", value, known.join(", "))
    })
}
