pub type Pool = sqlx::sqlite::SqlitePool;
pub type Transaction<'t> = sqlx::Transaction<'t, sqlx::Sqlite>;
pub type Error = sqlx::Error;

#[derive(Debug, serde::Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_url")]
    pub url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
        }
    }
}

impl Config {
    pub fn default_url() -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| String::from("sqlite::memory:"))
    }

    #[cfg(test)]
    pub fn test_env() -> Self {
        Self {
            url: String::from("sqlite::memory:"),
        }
    }

    pub async fn build(&self) -> Result<Pool, Error> {
        sqlx::sqlite::SqlitePoolOptions::new().connect(&self.url).await
    }
}

pub async fn migrate(pool: &Pool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!().run(pool).await
}
