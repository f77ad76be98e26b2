use clap::{Parser, Subcommand};
use learnhub::model::entity::{
    Badge, BadgeCreate, Course, CourseCreate, Lesson, LessonCreate, UserEntity,
    UserEntityCreateUpdate,
};
use learnhub::model::{CrudRepository, DatabaseError, DbConnection, ModelManager};
use learnhub::web::{AuthenticatedUser, UserRole};

#[derive(Parser, Debug)]
#[command(about = "CLI tool for seeding the learnhub database", long_about = None)]
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

    /// Manage badge tiers
    Badge {
        #[command(subcommand)]
        action: BadgeCommands,
    },
}

/// User management
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// learner, instructor or admin
        #[arg(long, default_value = "learner")]
        role: String,
        #[arg(long, default_value = "")]
        full_name: String,
    },
}

/// Course management
#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    Add {
        /// Username of the instructor who owns the course
        #[arg(long)]
        instructor: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        level: Option<String>,
        #[arg(long, default_value_t = false)]
        publish: bool,
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
        /// Path to a Markdown file with lesson content
        #[arg(long)]
        file: String,
        #[arg(long)]
        video_url: Option<String>,
        /// Appended after the last lesson when omitted
        #[arg(long)]
        order_index: Option<i32>,
    },
}

/// Badge management
#[derive(Subcommand, Debug)]
pub enum BadgeCommands {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        min_points: i32,
    },
}

#[tokio::main]
async fn main() -> learnhub::error::AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "DATABASE_URL is not set")
    })?;
    let db_con = DbConnection::connect(&database_url)?;
    db_con.migrate().await?;

    let mm = ModelManager::new(db_con);
    let actor = AuthenticatedUser::admin();

    match args.command {
        Commands::User { action } => match action {
            UserCommands::Add {
                username,
                email,
                password,
                role,
                full_name,
            } => {
                let role: UserRole = role
                    .parse()
                    .map_err(|e: String| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
                let user = UserEntity::create(
                    &mm,
                    &actor,
                    UserEntityCreateUpdate {
                        username,
                        email,
                        full_name,
                        password_hash: learnhub::auth::hash_password(&password)?,
                        role: role.to_string(),
                    },
                )
                .await?;
                println!("User created: {} ({}) {}", user.username(), user.role(), user.id());
            }
        },

        Commands::Course { action } => match action {
            CourseCommands::Add {
                instructor,
                title,
                description,
                category,
                level,
                publish,
            } => {
                let owner = UserEntity::find_by_username(&mm, &actor, &instructor)
                    .await?
                    .ok_or_else(|| {
                        std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            format!("no user named {}", instructor),
                        )
                    })?;
                let owner = AuthenticatedUser::new(owner.id(), owner.role());

                let course = Course::create(
                    &mm,
                    &owner,
                    CourseCreate {
                        title,
                        description,
                        category,
                        level,
                        is_published: Some(publish),
                    },
                )
                .await?;
                println!("Course created: {} {}", course.title(), course.id());
            }
        },

        Commands::Lesson { action } => match action {
            LessonCommands::Add {
                course_title,
                title,
                file,
                video_url,
                order_index,
            } => {
                let course_id: uuid::Uuid =
                    sqlx::query_scalar("SELECT id FROM courses WHERE title = $1")
                        .bind(&course_title)
                        .fetch_one(mm.executor())
                        .await
                        .map_err(DatabaseError::SqlxError)?;

                let content = std::fs::read_to_string(file)?;
                let lesson = Lesson::create(
                    &mm,
                    &actor,
                    LessonCreate {
                        course_id,
                        title,
                        content,
                        video_url,
                        order_index,
                    },
                )
                .await?;
                println!(
                    "Lesson created: {} #{} {}",
                    lesson.title(),
                    lesson.order_index(),
                    lesson.id()
                );
            }
        },

        Commands::Badge { action } => match action {
            BadgeCommands::Add {
                name,
                description,
                min_points,
            } => {
                let badge = Badge::create(
                    &mm,
                    &actor,
                    BadgeCreate {
                        name,
                        description,
                        min_points,
                    },
                )
                .await?;
                println!("Badge created: {} at {} points", badge.name(), badge.min_points());
            }
        },
    }

    Ok(())
}
