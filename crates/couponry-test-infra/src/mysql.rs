use crate::Result;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::ImageExt;
use testcontainers::{ContainerAsync, GenericImage};
use typed_builder::TypedBuilder;

const MYSQL_IMAGE: &str = "mysql";
const MYSQL_PORT: u16 = 3306;
const COUPON_USER: &str = "couponry";

/// Server image and schema for a coupon store under test.
#[derive(Debug, Clone, TypedBuilder)]
pub struct MysqlConfig {
    #[builder(default = "8.4".to_string(), setter(into))]
    tag: String,
    #[builder(default = "coupons".to_string(), setter(into))]
    database: String,
}

/// Disposable MySQL server holding an empty coupon database.
///
/// Dropping it stops the container.
pub struct MySqlServer {
    container: ContainerAsync<GenericImage>,
    database: String,
}

impl MySqlServer {
    pub async fn new(config: MysqlConfig) -> Result<Self> {
        let MysqlConfig { tag, database } = config;
        let container = GenericImage::new(MYSQL_IMAGE, tag.as_str())
            .with_exposed_port(MYSQL_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr("ready for connections"))
            .with_env_var("MYSQL_DATABASE", database.as_str())
            .with_env_var("MYSQL_USER", COUPON_USER)
            .with_env_var("MYSQL_PASSWORD", COUPON_USER)
            .with_env_var("MYSQL_ROOT_PASSWORD", "root")
            .start()
            .await?;

        Ok(Self {
            container,
            database,
        })
    }

    /// DSN for the coupon user, reachable from the host.
    pub async fn database_url(&self) -> Result<String> {
        let host = self.container.get_host().await?;
        let port = self.container.get_host_port_ipv4(MYSQL_PORT).await?;
        Ok(format!(
            "mysql://{COUPON_USER}:{COUPON_USER}@{host}:{port}/{}",
            self.database
        ))
    }
}
