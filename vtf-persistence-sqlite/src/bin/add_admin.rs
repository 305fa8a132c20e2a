use chrono::Utc;
use vtf_core::{Position, UNASSIGNED_TIER};
use vtf_persistence_sqlite::{create_db_pool, create_schema, users::SqliteUserRepository};
use vtf_server_domain::user::{Role, User, UserRepository};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 5 && args.len() != 6 {
        eprintln!(
            "Usage: add_admin <email> <nickname> <valorant_nickname> <password> [<position>]"
        );
        std::process::exit(1);
    }

    let email = &args[1];
    let nickname = &args[2];
    let valorant_nickname = &args[3];
    let password = &args[4];
    let position = match args.get(5) {
        Some(position) => position.parse::<Position>().unwrap_or_else(|e| {
            eprintln!("{}", e);
            std::process::exit(1);
        }),
        None => Position::Duelist,
    };

    let pool = create_db_pool().expect("Failed to create pool");
    create_schema(&pool).await.expect("Failed to create schema");
    let repository = SqliteUserRepository::new(pool);

    if repository
        .get_user_by_email(email)
        .await
        .expect("Failed to query for existing user")
        .is_some()
    {
        panic!("User with email [{}] already exists", email);
    }

    let password_hash =
        bcrypt::hash(password, bcrypt::DEFAULT_COST).expect("Failed to hash password");
    let now = Utc::now();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        email: email.clone(),
        nickname: nickname.clone(),
        valorant_nickname: valorant_nickname.clone(),
        password_hash,
        preferred_position: position,
        role: Role::Admin,
        tier: UNASSIGNED_TIER.to_string(),
        agent_stats: Vec::new(),
        league_point: 0,
        created_at: now,
        updated_at: now,
    };
    repository
        .create_user(&user)
        .await
        .expect("Failed to insert new user");

    println!("Created admin [{}] <{}>", nickname, email);
}
