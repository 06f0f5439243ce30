use clap::{Parser, Subcommand};
use coursehub::model::entity::{
    Course, CourseCreate, Lesson, LessonCreate, Subscription, SubscriptionCreate, UserEntity,
    UserEntityCreateUpdate,
};
use coursehub::auth::CryptError;
use coursehub::model::{CrudRepository, DatabaseError, DbConnection, ModelManager};
use coursehub::web::{AuthenticatedUser, UserRole};

#[derive(Parser, Debug)]
#[command(about = "CLI tool for filling the course catalog DB", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Manage courses
    Course {
        #[command(subcommand)]
        action: CourseCommands,
    },

    /// Manage lessons
    Lesson {
        #[command(subcommand)]
        action: LessonCommands,
    },

    /// Manage subscriptions
    Subscription {
        #[command(subcommand)]
        action: SubscriptionCommands,
    },
}

/// User management
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// `admin` or `user`
        #[arg(long, default_value = "user")]
        role: String,
    },
}

/// Course management
#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        preview: Option<String>,
        /// Username of the owner, admin otherwise
        #[arg(long)]
        owner: Option<String>,
    },
}

/// Lesson management
#[derive(Subcommand, Debug)]
pub enum LessonCommands {
    Add {
        /// Course title to attach the lesson to
        #[arg(long)]
        course_title: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        video_url: Option<String>,
        #[arg(long)]
        preview: Option<String>,
    },
}

/// Subscription management
#[derive(Subcommand, Debug)]
pub enum SubscriptionCommands {
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        course_title: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{what} `{name}` not found")]
    NotFound { what: &'static str, name: String },

    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Crypt(#[from] CryptError),
}

pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    fn not_found(what: &'static str, name: &str) -> Self {
        Self::NotFound { what, name: name.to_string() }
    }
}

async fn find_user(mm: &ModelManager, actor: &AuthenticatedUser, username: &str) -> CliResult<UserEntity> {
    UserEntity::find_by_username(mm, actor, username)
        .await?
        .ok_or_else(|| CliError::not_found("user", username))
}

async fn find_course(mm: &ModelManager, actor: &AuthenticatedUser, title: &str) -> CliResult<Course> {
    Course::find_by_title(mm, actor, title)
        .await?
        .ok_or_else(|| CliError::not_found("course", title))
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").map_err(|_| CliError::MissingEnv("DATABASE_URL"))?;
    let db_con = DbConnection::connect(&database_url)?;
    let mm = ModelManager::new(db_con);
    let admin = AuthenticatedUser::admin();

    match args.command {
        Commands::User { action } => match action {
            UserCommands::Add { username, password, role } => {
                let mut user = UserEntity::create(
                    &mm,
                    &admin,
                    UserEntityCreateUpdate {
                        username,
                        password_hash: coursehub::auth::hash_password(&password)?,
                    },
                )
                .await?;

                let role = UserRole::from(role.as_str());
                if role != UserRole::User {
                    user = user.set_role(&mm, &admin, role).await?;
                }
                println!("User created: {:?}", user);
            }
        },

        Commands::Course { action } => match action {
            CourseCommands::Add { title, description, preview, owner } => {
                // the course belongs to whoever is acting
                let actor = match owner {
                    Some(name) => {
                        let owner = find_user(&mm, &admin, &name).await?;
                        AuthenticatedUser::new(owner.id(), owner.role())
                    }
                    None => admin.clone(),
                };

                let course = Course::create(
                    &mm,
                    &actor,
                    CourseCreate { title, description, preview },
                )
                .await?;
                println!("Course created: {:?}", course);
            }
        },

        Commands::Lesson { action } => match action {
            LessonCommands::Add { course_title, title, description, video_url, preview } => {
                let course = find_course(&mm, &admin, &course_title).await?;
                let actor = match course.owner_id() {
                    Some(owner_id) => AuthenticatedUser::new(owner_id, UserRole::User),
                    None => admin.clone(),
                };

                let lesson = Lesson::create(
                    &mm,
                    &actor,
                    LessonCreate {
                        course_id: course.id(),
                        title,
                        description,
                        preview,
                        video_url,
                    },
                )
                .await?;
                println!("Lesson created: {:?}", lesson);
            }
        },

        Commands::Subscription { action } => match action {
            SubscriptionCommands::Add { username, course_title } => {
                let user = find_user(&mm, &admin, &username).await?;
                let course = find_course(&mm, &admin, &course_title).await?;

                if Subscription::exists_for(&mm, &admin, user.id(), course.id()).await? {
                    println!("{} already follows `{}`", user.username(), course.title());
                    return Ok(());
                }

                let subscription = Subscription::create(
                    &mm,
                    &admin,
                    SubscriptionCreate::new(user.id(), course.id()),
                )
                .await?;
                println!("Subscription created: {:?}", subscription);
            }
        },
    }

    Ok(())
}
