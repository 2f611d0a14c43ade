#[cfg(test)]
pub mod test {
    use serde::{Deserialize, Serialize};

    // -- Embedding and nesting fixture ------------------------------------------

    #[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
    pub struct B {
        pub n: i64,
    }

    crate::record! {
        B {
            leaf n as "N",
        }
    }

    #[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
    pub struct C {
        pub s: String,
        pub n: i64,
    }

    crate::record! {
        C {
            leaf s as "S",
            leaf n as "N",
        }
    }

    #[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
    pub struct Literal {
        pub n: i64,
    }

    crate::record! {
        Literal {
            leaf n as "N",
        }
    }

    /// `B` is embedded and its `N` is shadowed by `D::n`.
    #[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
    pub struct D {
        pub b: B,
        pub n: i64,
        pub nested: C,
        pub embedded: Literal,
    }

    crate::record! {
        D {
            embed b: B as "B",
            leaf n as "N",
            nested nested: C as "Nested",
            nested embedded: Literal as "Embedded",
        }
    }

    // -- Flat flow fixture ---------------------------------------------------

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct Cfg {
        pub number: i64,
        pub flag: bool,
        pub str1: String,
        pub str2: String,
    }

    crate::record! {
        Cfg {
            leaf number as "Number",
            leaf flag as "Flag",
            leaf str1 as "Str1",
            leaf str2 as "Str2",
        }
    }

    impl Cfg {
        pub fn defaults() -> Self {
            Cfg {
                number: -123,
                flag: true,
                str1: "qwe".into(),
                str2: "asd".into(),
            }
        }
    }

    // -- Application-shaped fixture ------------------------------------------

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct AppConfig {
        pub host: String,
        pub port: u16,
        pub debug: bool,
        pub database: DbConfig,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct DbConfig {
        pub url: Option<String>,
        pub pool_size: usize,
        pub replicas: Vec<String>,
    }

    crate::record! {
        AppConfig {
            leaf host as "Host",
            leaf port as "Port",
            leaf debug as "Debug",
            nested database: DbConfig as "Database",
        }
    }

    crate::record! {
        DbConfig {
            leaf url as "Url",
            leaf pool_size as "PoolSize" [env = "POOL"],
            leaf replicas as "Replicas",
        }
    }

    impl Default for AppConfig {
        fn default() -> Self {
            AppConfig {
                host: "localhost".into(),
                port: 8080,
                debug: false,
                database: DbConfig {
                    url: None,
                    pool_size: 5,
                    replicas: Vec::new(),
                },
            }
        }
    }

    #[test]
    fn app_config_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8080);
        assert!(!config.debug);
        assert_eq!(config.database.url, None);
        assert_eq!(config.database.pool_size, 5);
    }
}
