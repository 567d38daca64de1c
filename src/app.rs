use std::net::SocketAddr;
use axum::{response::Redirect, routing::get, Router};
use tower_http::trace::TraceLayer;
use crate::config::AppConfig;
use crate::personnes::{self, BASE_PATH};
use crate::state::AppState;

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(BASE_PATH, personnes::router())
        .route("/", get(|| async { Redirect::to(&personnes::page_url()) }))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = config.bind_addr().parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{self, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::events::{testing::RecordingListener, PersonEvent};
    use crate::personnes::repo_types::{Person, PersonDraft};

    struct TestApp {
        app: Router,
        state: AppState,
        listener: Arc<RecordingListener>,
    }

    impl TestApp {
        fn new() -> Self {
            let listener = Arc::new(RecordingListener::default());
            let state = AppState::in_memory_for_tests(listener.clone());
            Self {
                app: build_app(state.clone()),
                state,
                listener,
            }
        }

        async fn seed(&self, firstname: &str, lastname: &str, age: i32) -> Person {
            self.state
                .repo
                .save(PersonDraft::new(firstname, lastname, age))
                .await
                .expect("seed")
        }

        async fn get(&self, uri: &str) -> Response {
            let request = Request::get(uri).body(Body::empty()).expect("request");
            self.app.clone().oneshot(request).await.expect("response")
        }

        async fn post_form(&self, uri: &str, form: &str) -> Response {
            let request = Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))
                .expect("request");
            self.app.clone().oneshot(request).await.expect("response")
        }

        /// Follows the redirect by hand, replaying the flash cookie.
        async fn follow(&self, res: Response) -> Response {
            let location = location(&res).to_string();
            let mut builder = Request::get(location);
            if let Some(cookie) = res.headers().get(header::SET_COOKIE) {
                let pair = cookie.to_str().expect("ascii").split(';').next().expect("pair");
                builder = builder.header(header::COOKIE, pair);
            }
            let request = builder.body(Body::empty()).expect("request");
            self.app.clone().oneshot(request).await.expect("response")
        }
    }

    fn location(res: &Response) -> &str {
        res.headers()
            .get(header::LOCATION)
            .expect("location header")
            .to_str()
            .expect("ascii")
    }

    async fn text(res: Response) -> String {
        let bytes = body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf-8")
    }

    fn row_count(html: &str) -> usize {
        html.matches(r#"<tr class="personne""#).count()
    }

    #[tokio::test]
    async fn health_and_root_redirect() {
        let t = TestApp::new();
        let res = t.get("/health").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(text(res).await, "ok");

        let res = t.get("/").await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/personne/page");
    }

    #[tokio::test]
    async fn list_all_renders_every_record() {
        let t = TestApp::new();
        t.seed("Jean", "Dupont", 30).await;
        t.seed("Marie", "Curie", 66).await;

        let res = t.get("/personne/all").await;
        assert_eq!(res.status(), StatusCode::OK);
        let html = text(res).await;
        assert_eq!(row_count(&html), 2);
        assert!(html.contains("Curie"));
    }

    #[tokio::test]
    async fn age_range_is_inclusive() {
        let t = TestApp::new();
        for (i, age) in [17, 18, 25, 30, 31].into_iter().enumerate() {
            t.seed("P", &format!("Age{age}x{i}"), age).await;
        }

        let html = text(t.get("/personne/age/18/30").await).await;
        assert_eq!(row_count(&html), 3);
        assert!(html.contains("Age18x1"));
        assert!(html.contains("Age30x3"));
        assert!(!html.contains("Age17x0"));
        assert!(!html.contains("Age31x4"));
    }

    #[tokio::test]
    async fn firstname_filter_orders_oldest_first() {
        let t = TestApp::new();
        t.seed("Jean", "Young", 20).await;
        t.seed("Paul", "Other", 90).await;
        t.seed("Jean", "Old", 70).await;

        let html = text(t.get("/personne/firstname/Jean").await).await;
        assert_eq!(row_count(&html), 2);
        let old = html.find("Old").expect("old");
        let young = html.find("Young").expect("young");
        assert!(old < young);
        assert!(!html.contains("Other"));
    }

    #[tokio::test]
    async fn paging_reports_page_count_and_tolerates_overflow() {
        let t = TestApp::new();
        for i in 0..25 {
            t.seed("P", &format!("N{i}"), i).await;
        }

        let html = text(t.get("/personne/page/3/10").await).await;
        assert_eq!(row_count(&html), 5);
        assert!(html.contains(r#"data-page-count="3""#));

        let res = t.get("/personne/page/4/10").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(row_count(&text(res).await), 0);

        let html = text(t.get("/personne/page").await).await;
        assert_eq!(row_count(&html), 10);
        assert!(html.contains(r#"data-page="1" data-page-count="3""#));

        let html = text(t.get("/personne/page/2").await).await;
        assert_eq!(row_count(&html), 10);
    }

    #[tokio::test]
    async fn detail_of_missing_person_shows_one_notice() {
        let t = TestApp::new();
        let res = t.get("/personne/42").await;
        assert_eq!(res.status(), StatusCode::OK);
        let html = text(res).await;
        assert_eq!(html.matches("La personne n&#39;existe pas").count(), 1);
    }

    #[tokio::test]
    async fn detail_of_existing_person() {
        let t = TestApp::new();
        let p = t.seed("Jean", "Dupont", 30).await;
        let html = text(t.get(&format!("/personne/{}", p.id)).await).await;
        assert!(html.contains("Dupont"));
        assert!(!html.contains("alert-error"));
    }

    #[tokio::test]
    async fn create_persists_and_fires_one_event() {
        let t = TestApp::new();
        let res = t
            .post_form("/personne/add", "firstname=Jean&lastname=Dupont&age=30")
            .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/personne/page");

        let all = t.state.repo.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(
            (all[0].firstname.as_str(), all[0].lastname.as_str(), all[0].age),
            ("Jean", "Dupont", 30)
        );

        let events = t.listener.events();
        assert_eq!(events.len(), 1);
        let PersonEvent::Added(added) = &events[0];
        assert_eq!(added.id, all[0].id);

        let html = text(t.follow(res).await).await;
        assert!(html.contains("Dupont ajoutée avec succès"));
    }

    #[tokio::test]
    async fn flash_is_shown_once() {
        let t = TestApp::new();
        let res = t
            .post_form("/personne/add", "firstname=Jean&lastname=Dupont&age=30")
            .await;
        let page = t.follow(res).await;
        let cleared = page
            .headers()
            .get(header::SET_COOKIE)
            .expect("clearing cookie")
            .to_str()
            .unwrap()
            .to_string();
        assert!(cleared.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn invalid_form_is_rendered_again() {
        let t = TestApp::new();
        let res = t
            .post_form("/personne/add", "firstname=&lastname=Dupont&age=vieux")
            .await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = text(res).await;
        assert!(html.contains("invalid-feedback"));
        assert!(html.contains(r#"value="vieux""#));
        assert_eq!(t.state.repo.count().await.unwrap(), 0);
        assert!(t.listener.events().is_empty());
    }

    #[tokio::test]
    async fn add_and_edit_forms_render_on_get() {
        let t = TestApp::new();
        let p = t.seed("Jean", "Dupont", 30).await;

        let html = text(t.get("/personne/add").await).await;
        assert!(html.contains(r#"action="/personne/add""#));

        let html = text(t.get(&format!("/personne/edit/{}", p.id)).await).await;
        assert!(html.contains(&format!(r#"action="/personne/edit/{}""#, p.id)));
        assert!(html.contains(r#"value="Dupont""#));

        let html = text(t.get("/personne/edit").await).await;
        assert!(html.contains(r#"action="/personne/edit""#));
        assert!(html.contains(r#"value="""#));
    }

    #[tokio::test]
    async fn edit_without_id_behaves_like_create() {
        for uri in ["/personne/edit", "/personne/edit/0", "/personne/edit/999"] {
            let t = TestApp::new();
            let res = t
                .post_form(uri, "firstname=Jean&lastname=Dupont&age=30")
                .await;
            assert_eq!(res.status(), StatusCode::SEE_OTHER, "{uri}");

            let all = t.state.repo.find_all().await.unwrap();
            assert_eq!(all.len(), 1, "{uri}");
            assert_eq!(all[0].lastname, "Dupont");
            assert_eq!(t.listener.events().len(), 1, "{uri}");

            let html = text(t.follow(res).await).await;
            assert!(html.contains("Dupont a été ajouté avec succès"), "{uri}");
        }
    }

    #[tokio::test]
    async fn edit_of_existing_updates_in_place_without_event() {
        let t = TestApp::new();
        let p = t.seed("Jean", "Dupont", 30).await;

        let res = t
            .post_form(
                &format!("/personne/edit/{}", p.id),
                "firstname=Jeanne&lastname=Durand&age=31",
            )
            .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);

        let all = t.state.repo.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, p.id);
        assert_eq!(
            (all[0].firstname.as_str(), all[0].lastname.as_str(), all[0].age),
            ("Jeanne", "Durand", 31)
        );
        assert!(t.listener.events().is_empty());

        let html = text(t.follow(res).await).await;
        assert!(html.contains("Durand a été mis à jour avec succès"));
    }

    #[tokio::test]
    async fn delete_removes_only_the_target() {
        let t = TestApp::new();
        let keep = t.seed("Jean", "Dupont", 30).await;
        let gone = t.seed("Marie", "Curie", 66).await;

        let res = t.get(&format!("/personne/delete/{}", gone.id)).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert!(t.state.repo.find(gone.id).await.unwrap().is_none());
        assert_eq!(t.state.repo.find(keep.id).await.unwrap(), Some(keep));

        let html = text(t.follow(res).await).await;
        assert!(html.contains("Suppression réussie"));
    }

    #[tokio::test]
    async fn delete_of_missing_person_is_a_noop_with_notice() {
        let t = TestApp::new();
        t.seed("Jean", "Dupont", 30).await;

        let res = t.get("/personne/delete/77").await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(t.state.repo.count().await.unwrap(), 1);

        let html = text(t.follow(res).await).await;
        assert!(html.contains(r#"alert-error">La personne n&#39;existe pas"#));
    }

    #[tokio::test]
    async fn direct_update_overwrites_all_fields() {
        let t = TestApp::new();
        let p = t.seed("Jean", "Dupont", 30).await;

        let res = t
            .get(&format!("/personne/update/{}/Jeanne/Durand/31", p.id))
            .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        let stored = t.state.repo.find(p.id).await.unwrap().expect("still there");
        assert_eq!(
            (stored.firstname.as_str(), stored.lastname.as_str(), stored.age),
            ("Jeanne", "Durand", 31)
        );
        assert!(t.listener.events().is_empty());

        let html = text(t.follow(res).await).await;
        assert!(html.contains("Mise à jour réussie"));
    }

    #[tokio::test]
    async fn direct_update_of_missing_person_changes_nothing() {
        let t = TestApp::new();
        let p = t.seed("Jean", "Dupont", 30).await;

        let res = t.get("/personne/update/99/Jeanne/Durand/31").await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(t.state.repo.find_all().await.unwrap(), vec![p]);

        let html = text(t.follow(res).await).await;
        assert!(html.contains("La personne n&#39;existe pas"));
    }

    #[tokio::test]
    async fn extreme_page_numbers_render_an_empty_page() {
        let t = TestApp::new();
        t.seed("Jean", "Dupont", 30).await;
        t.seed("Marie", "Curie", 66).await;

        for uri in [
            "/personne/page/9223372036854775807/10",
            "/personne/page/9223372036854775807/9223372036854775807",
        ] {
            let res = t.get(uri).await;
            assert_eq!(res.status(), StatusCode::OK, "{uri}");
            assert_eq!(row_count(&text(res).await), 0, "{uri}");
        }

        let res = t.get("/personne/page/1/9223372036854775807").await;
        assert_eq!(res.status(), StatusCode::OK);
        let html = text(res).await;
        assert_eq!(row_count(&html), 2);
        assert!(html.contains(r#"data-page-count="1""#));
    }

    #[tokio::test]
    async fn negative_ids_are_rejected() {
        let t = TestApp::new();
        t.seed("Jean", "Dupont", 30).await;

        for uri in [
            "/personne/-3",
            "/personne/edit/-3",
            "/personne/delete/-1",
            "/personne/update/-1/Jeanne/Durand/31",
        ] {
            let res = t.get(uri).await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
        let all = t.state.repo.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].lastname, "Dupont");
    }

    #[tokio::test]
    async fn ids_beyond_storage_range_are_not_found() {
        let t = TestApp::new();
        let res = t.get("/personne/18446744073709551615").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(text(res).await.contains("La personne n&#39;existe pas"));
    }

    #[tokio::test]
    async fn direct_update_with_overlong_name_fails_without_change() {
        let t = TestApp::new();
        let p = t.seed("Jean", "Dupont", 30).await;

        let long = "x".repeat(51);
        let res = t
            .get(&format!("/personne/update/{}/{long}/Durand/31", p.id))
            .await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(t.state.repo.find(p.id).await.unwrap(), Some(p));
    }

    #[tokio::test]
    async fn malformed_id_is_rejected_by_the_router() {
        let t = TestApp::new();
        let res = t.get("/personne/delete/abc").await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
