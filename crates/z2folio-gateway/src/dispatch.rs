//! The operation dispatcher: adapts the four protocol hooks the ASN.1/BER frontend calls
//! (init, search, fetch, delete) to the session, query translator, and back-end client, with
//! a uniform failure trap translating every [`Diagnostic`] into the `(errorCode, errorString)`
//! shape the framework expects.

use std::path::Path;

use z2folio_backend::BackendClient;
use z2folio_core::config::Config;
use z2folio_core::diagnostic::Diagnostic;
use z2folio_core::rpn::Rpn;
use z2folio_query::translate;
use z2folio_session::{ResultSet, Session};

use crate::render::render_instance;

/// `implementationId` reported on every successful init.
pub const IMPLEMENTATION_ID: &str = "81";
/// `implementationName` reported on every successful init.
pub const IMPLEMENTATION_NAME: &str = "z2folio gateway";

/// The query a `search` call is given: either CQL the framework already parsed, or an RPN
/// tree plus the attribute-set OID the search request carried. Pre-parsed CQL is used as
/// given; an RPN tree is translated first.
#[derive(Debug, Clone)]
pub enum SearchQuery {
    Cql(String),
    Rpn {
        rpn: Rpn,
        default_attribute_set: Option<String>,
    },
}

/// Result of a successful `init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitOutcome {
    pub implementation_id: String,
    pub implementation_name: String,
    pub implementation_version: String,
}

impl Default for InitOutcome {
    fn default() -> Self {
        Self {
            implementation_id: IMPLEMENTATION_ID.to_string(),
            implementation_name: IMPLEMENTATION_NAME.to_string(),
            implementation_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Result of a successful `fetch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub form: String,
    pub record: String,
}

/// A diagnostic, reshaped for the framework boundary: either a reportable
/// `(errorCode, errorString)` pair, or an abort signal for an unexpected internal error that
/// must propagate upward rather than be reported.
#[derive(Debug)]
pub enum DispatchOutcome<T> {
    Ok(T),
    Failure { error_code: u32, error_string: String },
    Abort(anyhow::Error),
}

/// Applies the uniform failure trap: a BIB-1-tagged diagnostic becomes
/// `{errorCode, errorString}`; any other message-carrying failure maps to code 100; an
/// internal error propagates as [`DispatchOutcome::Abort`] to abort the association.
fn trap<T>(result: Result<T, Diagnostic>) -> DispatchOutcome<T> {
    match result {
        Ok(value) => DispatchOutcome::Ok(value),
        Err(Diagnostic::Internal(err)) => DispatchOutcome::Abort(err),
        Err(diagnostic) => DispatchOutcome::Failure {
            error_code: diagnostic.code().unwrap_or(100),
            error_string: diagnostic.addinfo(),
        },
    }
}

/// Adapts the four protocol hooks to the session/translator/back-end layers. Holds only the
/// reusable HTTP client; all per-association state lives in the [`Session`] the caller
/// passes to each method, so there is no process-wide mutable registry.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    backend: BackendClient,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            backend: BackendClient::new(),
        }
    }

    /// `init`: reload configuration fresh from `config_path`, resolve credentials, log in,
    /// and return a freshly constructed [`Session`] plus the implementation-identity triple.
    pub async fn init(
        &self,
        config_path: impl AsRef<Path>,
        username: Option<String>,
        password: Option<String>,
    ) -> DispatchOutcome<(Session, InitOutcome)> {
        let config = match Config::load_from_file(config_path) {
            Ok(config) => config,
            Err(err) => {
                return trap(Err(Diagnostic::backend_login_failed(format!(
                    "failed to load configuration: {err}"
                ))));
            }
        };

        let mut session = Session::new(config);
        match session.login(&self.backend, username, password).await {
            Ok(()) => DispatchOutcome::Ok((session, InitOutcome::default())),
            Err(diagnostic) => trap(Err(diagnostic)),
        }
    }

    /// `search`: produce CQL (translating RPN if necessary), install a fresh result set
    /// under `setname` (replacing any prior one), perform the initial chunk fetch, and
    /// return the total hit count.
    pub async fn search(
        &self,
        session: &mut Session,
        setname: &str,
        query: SearchQuery,
    ) -> DispatchOutcome<u64> {
        trap(self.search_inner(session, setname, query).await)
    }

    async fn search_inner(
        &self,
        session: &mut Session,
        setname: &str,
        query: SearchQuery,
    ) -> Result<u64, Diagnostic> {
        let cql = match query {
            SearchQuery::Cql(cql) => cql,
            SearchQuery::Rpn {
                rpn,
                default_attribute_set,
            } => translate(
                &rpn,
                default_attribute_set.as_deref(),
                session.config(),
                session,
            )?,
        };

        let chunk_size = session.config().chunk_size();
        let base_url = session.config().search_base_url().to_string();
        let tenant = session.config().tenant.clone();
        let token = session.token().map(str::to_string);

        let mut result_set = ResultSet::new(setname, cql);
        let result = self
            .backend
            .search(&base_url, &tenant, token.as_deref(), result_set.cql(), 0, chunk_size)
            .await
            .map_err(|e| Diagnostic::backend_search_failed(e.to_string()))?;

        result_set.set_total(result.total_records)?;
        result_set.insert(0, &result.instances);
        let hits = result_set.total().unwrap_or(0);

        tracing::info!(setname, hits, "search produced result set");
        session.put_result_set(result_set);
        Ok(hits)
    }

    /// `fetch`: locate the named result set, validate the requested ordinal, ensure it is
    /// materialized (fetching a further chunk if necessary), and render the stored instance
    /// document as XML.
    pub async fn fetch(
        &self,
        session: &mut Session,
        setname: &str,
        ordinal: u64,
    ) -> DispatchOutcome<FetchOutcome> {
        trap(self.fetch_inner(session, setname, ordinal).await)
    }

    async fn fetch_inner(
        &self,
        session: &mut Session,
        setname: &str,
        ordinal: u64,
    ) -> Result<FetchOutcome, Diagnostic> {
        let chunk_size = session.config().chunk_size();
        let base_url = session.config().search_base_url().to_string();
        let tenant = session.config().tenant.clone();
        let token = session.token().map(str::to_string);

        let result_set = session
            .result_set_mut(setname)
            .ok_or_else(|| Diagnostic::result_set_not_found(setname))?;

        let total = result_set.total().unwrap_or(0);
        if ordinal < 1 || ordinal > total {
            return Err(Diagnostic::PresentOutOfRange(ordinal));
        }

        let record = result_set
            .ensure_materialized(ordinal, chunk_size, &self.backend, &base_url, &tenant, token.as_deref())
            .await?;

        Ok(FetchOutcome {
            form: "xml".to_string(),
            record: render_instance(record),
        })
    }

    /// `delete`: discard the named result set.
    pub fn delete(&self, session: &mut Session, setname: &str) -> DispatchOutcome<()> {
        trap(if session.remove_result_set(setname) {
            Ok(())
        } else {
            Err(Diagnostic::result_set_not_found(setname))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use z2folio_core::rpn::{AttributeElement, Term};

    async fn session_with_config(json: &str) -> Session {
        Session::new(Config::from_json_str(json).unwrap())
    }

    #[tokio::test]
    async fn init_fails_1014_when_backend_rejects_login() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bl-users/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"errorMessage": "bad credentials"})),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(
            &config_path,
            format!(
                r#"{{"baseUrl":"{}","tenant":"diku","credentials":{{"username":"admin","password":"wrong"}}}}"#,
                server.uri()
            ),
        )
        .unwrap();

        let dispatcher = Dispatcher::new();
        match dispatcher.init(&config_path, None, None).await {
            DispatchOutcome::Failure { error_code, .. } => assert_eq!(error_code, 1014),
            other => panic!("expected a 1014 failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn search_then_fetch_materializes_first_chunk() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/inventory/instances"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "totalRecords": 2,
                "instances": [{"title": "Cat's cradle"}, {"title": "The Sirens of Titan"}]
            })))
            .mount(&server)
            .await;

        let config = format!(
            r#"{{"baseUrl":"{}","tenant":"diku","indexMap":{{"4":"title"}},"chunkSize":5}}"#,
            server.uri()
        );
        let mut session = session_with_config(&config).await;
        let dispatcher = Dispatcher::new();

        let rpn = Rpn::Term(Term {
            attributes: vec![AttributeElement {
                set: None,
                attr_type: 1,
                value: 4,
            }],
            term: "cat".to_string(),
        });

        match dispatcher
            .search(
                &mut session,
                "s1",
                SearchQuery::Rpn {
                    rpn,
                    default_attribute_set: None,
                },
            )
            .await
        {
            DispatchOutcome::Ok(hits) => assert_eq!(hits, 2),
            other => panic!("expected Ok, got {other:?}"),
        }

        match dispatcher.fetch(&mut session, "s1", 1).await {
            DispatchOutcome::Ok(outcome) => {
                assert_eq!(outcome.form, "xml");
                assert!(outcome.record.contains("Cat's cradle"));
            }
            other => panic!("expected Ok, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_out_of_range_fails_13() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/inventory/instances"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "totalRecords": 1,
                "instances": [{"title": "x"}]
            })))
            .mount(&server)
            .await;

        let config = format!(r#"{{"baseUrl":"{}","tenant":"diku"}}"#, server.uri());
        let mut session = session_with_config(&config).await;
        let dispatcher = Dispatcher::new();

        dispatcher
            .search(&mut session, "s1", SearchQuery::Cql("cql.serverChoice=x".to_string()))
            .await;

        match dispatcher.fetch(&mut session, "s1", 5).await {
            DispatchOutcome::Failure { error_code, .. } => assert_eq!(error_code, 13),
            other => panic!("expected a 13 failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_missing_result_set_fails_30() {
        let mut session = session_with_config(r#"{"baseUrl":"http://x","tenant":"diku"}"#).await;
        let dispatcher = Dispatcher::new();
        match dispatcher.fetch(&mut session, "nope", 1).await {
            DispatchOutcome::Failure { error_code, error_string } => {
                assert_eq!(error_code, 30);
                assert_eq!(error_string, "nope");
            }
            other => panic!("expected a 30 failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_discards_result_set_and_invalidates_subsequent_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/inventory/instances"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "totalRecords": 1,
                "instances": [{"title": "x"}]
            })))
            .mount(&server)
            .await;

        let config = format!(r#"{{"baseUrl":"{}","tenant":"diku"}}"#, server.uri());
        let mut session = session_with_config(&config).await;
        let dispatcher = Dispatcher::new();
        dispatcher
            .search(&mut session, "s1", SearchQuery::Cql("x".to_string()))
            .await;

        match dispatcher.delete(&mut session, "s1") {
            DispatchOutcome::Ok(()) => {}
            other => panic!("expected Ok, got {other:?}"),
        }

        match dispatcher.fetch(&mut session, "s1", 1).await {
            DispatchOutcome::Failure { error_code, .. } => assert_eq!(error_code, 30),
            other => panic!("expected a 30 failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn illegal_result_set_reference_fails_128() {
        let mut session = session_with_config(r#"{"baseUrl":"http://x","tenant":"diku"}"#).await;
        let dispatcher = Dispatcher::new();
        let rpn = Rpn::Rsid {
            id: "missing".to_string(),
        };
        match dispatcher
            .search(
                &mut session,
                "s1",
                SearchQuery::Rpn {
                    rpn,
                    default_attribute_set: None,
                },
            )
            .await
        {
            DispatchOutcome::Failure { error_code, error_string } => {
                assert_eq!(error_code, 128);
                assert_eq!(error_string, "missing");
            }
            other => panic!("expected a 128 failure, got {other:?}"),
        }
    }
}
