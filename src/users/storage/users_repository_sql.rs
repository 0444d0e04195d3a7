use async_trait::async_trait;
use sqlx::*;

use crate::error::{ApiError, Result};
use crate::storage::database::{FromSqlxError, SqlxDatabase, ToVoid};
use crate::users::{NewUser, Role, User, UserId, UsersRepository};

const SELECT_USER: &str = "SELECT u.id, u.username, u.first_name, u.last_name, u.email, u.phone_number, u.is_staff, r.id AS role_id, r.name AS role_name FROM user u LEFT JOIN role r ON u.role_id = r.id";

#[derive(Clone)]
pub struct UsersSqlxDatabase {
    database: SqlxDatabase,
}

impl UsersSqlxDatabase {
    pub fn new(database: SqlxDatabase) -> Self {
        debug!("create a repository for users");
        Self { database }
    }

    /// Create a new in-memory database
    pub async fn create() -> Result<Self> {
        Ok(Self::new(SqlxDatabase::in_memory("users").await?))
    }
}

#[async_trait]
impl UsersRepository for UsersSqlxDatabase {
    async fn store_role(&self, name: &str) -> Result<Role> {
        query("INSERT OR IGNORE INTO role (name) VALUES (?)")
            .bind(name)
            .execute(&*self.database.pool)
            .await
            .void()?;
        self.get_role_by_name(name)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("role {name}")))
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        let query = query_as("SELECT id, name FROM role WHERE name = ?").bind(name);
        let row: Option<RoleRow> = query
            .fetch_optional(&*self.database.pool)
            .await
            .into_core()?;
        Ok(row.map(|r| r.role()))
    }

    async fn store_user(&self, user: NewUser) -> Result<User> {
        user.validate()?;
        let query = query(
            "INSERT INTO user (username, first_name, last_name, email, phone_number, is_staff) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(user.is_staff);
        let result = query.execute(&*self.database.pool).await.into_core()?;
        Ok(User::new(result.last_insert_rowid(), user, None))
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let sql = format!("{SELECT_USER} WHERE u.id = ?");
        let query = query_as(&sql).bind(id);
        let row: Option<UserRow> = query
            .fetch_optional(&*self.database.pool)
            .await
            .into_core()?;
        Ok(row.map(|r| r.user()))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("{SELECT_USER} WHERE u.username = ?");
        let query = query_as(&sql).bind(username);
        let row: Option<UserRow> = query
            .fetch_optional(&*self.database.pool)
            .await
            .into_core()?;
        Ok(row.map(|r| r.user()))
    }

    async fn set_user_role(&self, id: UserId, role_name: &str) -> Result<()> {
        let role = self.store_role(role_name).await?;
        let query = query("UPDATE user SET role_id = ? WHERE id = ?")
            .bind(role.id())
            .bind(id);
        let result = query.execute(&*self.database.pool).await.into_core()?;
        if result.rows_affected() == 0 {
            return Err(ApiError::not_found(format!("user {id}")));
        }
        Ok(())
    }

    async fn get_users(&self) -> Result<Vec<User>> {
        let sql = format!("{SELECT_USER} ORDER BY u.username");
        let query = query_as(&sql);
        let rows: Vec<UserRow> = query.fetch_all(&*self.database.pool).await.into_core()?;
        Ok(rows.iter().map(|r| r.user()).collect())
    }
}

// Database serialization / deserialization

#[derive(FromRow)]
struct RoleRow {
    id: i64,
    name: String,
}

impl RoleRow {
    fn role(&self) -> Role {
        Role::new(self.id, self.name.clone())
    }
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    phone_number: String,
    is_staff: bool,
    role_id: Option<i64>,
    role_name: Option<String>,
}

impl UserRow {
    fn user(&self) -> User {
        let role = match (self.role_id, &self.role_name) {
            (Some(id), Some(name)) => Some(Role::new(id, name.clone())),
            _ => None,
        };
        let user = NewUser {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
            is_staff: self.is_staff,
        };
        User::new(self.id, user, role)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::users::EDU_OWNER_ROLE;

    #[tokio::test]
    async fn test_repository() -> Result<()> {
        let repository = UsersSqlxDatabase::create().await?;

        // store some users
        let alice = repository
            .store_user(
                NewUser::new("alice", "+998901111111")
                    .with_name("Alice", "Smith")
                    .with_email("alice@example.com"),
            )
            .await?;
        let bob = repository
            .store_user(NewUser::new("bob", "+998902222222").staff())
            .await?;
        assert!(bob.is_staff());
        assert_eq!(repository.get_user(alice.id()).await?, Some(alice.clone()));
        assert_eq!(
            repository.get_user_by_username("bob").await?,
            Some(bob.clone())
        );
        assert_eq!(repository.get_users().await?, vec![alice.clone(), bob]);

        // give a role to a user
        repository.set_user_role(alice.id(), EDU_OWNER_ROLE).await?;
        let alice = repository.get_user(alice.id()).await?;
        assert!(alice.is_some_and(|a| a.has_role(EDU_OWNER_ROLE)));
        Ok(())
    }

    #[tokio::test]
    async fn test_roles() -> Result<()> {
        let repository = UsersSqlxDatabase::create().await?;

        // storing a role twice returns the same role
        let role = repository.store_role(EDU_OWNER_ROLE).await?;
        assert_eq!(repository.store_role(EDU_OWNER_ROLE).await?, role);
        assert_eq!(
            repository.get_role_by_name(EDU_OWNER_ROLE).await?,
            Some(role)
        );
        assert_eq!(repository.get_role_by_name("admin").await?, None);

        // an unknown user cannot get a role
        let result = repository.set_user_role(42, EDU_OWNER_ROLE).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_unique_users() -> Result<()> {
        let repository = UsersSqlxDatabase::create().await?;
        repository
            .store_user(NewUser::new("alice", "+998901111111"))
            .await?;

        let same_username = repository
            .store_user(NewUser::new("alice", "+998903333333"))
            .await;
        assert!(same_username.unwrap_err().is_constraint_violation());

        let same_phone_number = repository
            .store_user(NewUser::new("carol", "+998901111111"))
            .await;
        assert!(same_phone_number.unwrap_err().is_constraint_violation());

        let invalid_phone_number = repository
            .store_user(NewUser::new("dave", "+99890111111111"))
            .await;
        assert!(matches!(invalid_phone_number, Err(ApiError::Invalid(_))));
        Ok(())
    }
}
