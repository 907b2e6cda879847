//! End-to-end REST API tests through the full router
//!
//! Invoke `rest_api_tests!(movie_store_expr, user_store_expr, review_store_expr)`
//! where every expression is async and returns a fresh, empty store.

/// Generate the REST API test suite for a set of stores
#[macro_export]
macro_rules! rest_api_tests {
    ($movies:expr, $users:expr, $reviews:expr) => {
        mod rest_api_tests {
            use super::*;
            use axum::http::StatusCode;
            use axum_test::TestServer;
            use marquee::core::auth::{USER_ID_HEADER, USER_ROLES_HEADER};
            use marquee::server::ServerBuilder;
            use serde_json::{Value, json};

            async fn server_with(movies: Vec<marquee::core::movie::MovieRecord>) -> TestServer {
                let movie_store = $movies;
                seed(&movie_store, movies).await;
                let app = ServerBuilder::new()
                    .with_movie_store(movie_store)
                    .with_user_store($users)
                    .with_review_store($reviews)
                    .build()
                    .unwrap();
                TestServer::try_new(app).unwrap()
            }

            async fn server() -> TestServer {
                server_with(Vec::new()).await
            }

            fn listed_ids(body: &Value) -> Vec<Value> {
                body["items"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|m| m["id"].clone())
                    .collect()
            }

            async fn create_profile(server: &TestServer, user: &uuid::Uuid) {
                server
                    .put("/users/profile")
                    .add_header(USER_ID_HEADER, user.to_string())
                    .json(&json!({ "username": "cinephile", "email": "Fan@Example.com" }))
                    .await
                    .assert_status_ok();
            }

            // =================================================================
            // Health
            // =================================================================

            #[tokio::test]
            async fn test_health() {
                let server = server().await;
                let response = server.get("/health").await;
                response.assert_status_ok();
                assert_eq!(response.json::<Value>()["status"], "ok");
                server.get("/healthz").await.assert_status_ok();
            }

            // =================================================================
            // Listing
            // =================================================================

            #[tokio::test]
            async fn test_list_defaults() {
                let server = server_with(scenario_catalog()).await;
                let response = server.get("/movies").await;
                response.assert_status_ok();

                let body: Value = response.json();
                assert_eq!(body["totalMatching"], 12);
                assert_eq!(body["totalPages"], 2);
                assert_eq!(body["currentPage"], 1);
                assert_eq!(body["pageSize"], 10);
                assert_eq!(body["items"].as_array().unwrap().len(), 10);
            }

            #[tokio::test]
            async fn test_list_rating_scenario() {
                let server = server_with(scenario_catalog()).await;
                let response = server
                    .get("/movies")
                    .add_query_param("minRating", "7")
                    .add_query_param("sortBy", "rating")
                    .add_query_param("pageSize", "2")
                    .add_query_param("page", "2")
                    .await;
                response.assert_status_ok();

                let body: Value = response.json();
                assert_eq!(body["totalMatching"], 5);
                assert_eq!(body["totalPages"], 3);
                assert_eq!(listed_ids(&body), vec![json!(10), json!(8)]);
            }

            #[tokio::test]
            async fn test_list_all_filters_are_ignored() {
                let server = server_with(scenario_catalog()).await;
                let response = server
                    .get("/movies")
                    .add_query_param("genre", "all")
                    .add_query_param("year", "ALL")
                    .add_query_param("rating", "")
                    .await;
                response.assert_status_ok();
                assert_eq!(response.json::<Value>()["totalMatching"], 12);
            }

            #[tokio::test]
            async fn test_list_genre_and_limit() {
                let server = server_with(scenario_catalog()).await;
                let response = server
                    .get("/movies")
                    .add_query_param("genre", "Comedy")
                    .add_query_param("limit", "2")
                    .add_query_param("sort", "popularity")
                    .await;
                response.assert_status_ok();

                let body: Value = response.json();
                assert_eq!(body["totalMatching"], 3);
                assert_eq!(body["totalPages"], 2);
                assert_eq!(listed_ids(&body), vec![json!(10), json!(11)]);
            }

            #[tokio::test]
            async fn test_list_rejects_bad_parameters() {
                let server = server().await;
                for (name, value) in [
                    ("page", "0"),
                    ("page", "two"),
                    ("pageSize", "101"),
                    ("year", "nineteen"),
                    ("year", "+2007"),
                    ("rating", "11"),
                    ("sort", "loudness"),
                ] {
                    let response = server.get("/movies").add_query_param(name, value).await;
                    response.assert_status(StatusCode::BAD_REQUEST);
                    assert_eq!(
                        response.json::<Value>()["code"],
                        "INVALID_PARAMETER",
                        "{name}={value}"
                    );
                }
            }

            #[tokio::test]
            async fn test_list_page_past_end() {
                let server = server_with(scenario_catalog()).await;
                let response = server.get("/movies").add_query_param("page", "5").await;
                response.assert_status_ok();
                let body: Value = response.json();
                assert!(body["items"].as_array().unwrap().is_empty());
                assert_eq!(body["currentPage"], 5);
                assert_eq!(body["totalMatching"], 12);
            }

            #[tokio::test]
            async fn test_facets() {
                let server = server_with(varied_catalog()).await;
                let response = server.get("/movies/facets").await;
                response.assert_status_ok();

                let body: Value = response.json();
                assert_eq!(body["availableYears"][0], "2007");
                assert_eq!(body["availableGenres"][0], "Comedy");
                assert_eq!(body["availableGenres"].as_array().unwrap().len(), 8);
            }

            // =================================================================
            // Single movie
            // =================================================================

            #[tokio::test]
            async fn test_get_movie() {
                let server = server_with(scenario_catalog()).await;
                let response = server.get("/movies/3").await;
                response.assert_status_ok();
                assert_eq!(response.json::<Value>()["title"], "Cedar");
            }

            #[tokio::test]
            async fn test_get_missing_movie() {
                let server = server().await;
                let response = server.get("/movies/42").await;
                response.assert_status(StatusCode::NOT_FOUND);
                assert_eq!(response.json::<Value>()["code"], "MOVIE_NOT_FOUND");
            }

            // =================================================================
            // Authoring
            // =================================================================

            #[tokio::test]
            async fn test_create_requires_admin() {
                let server = server().await;

                server
                    .post("/movies")
                    .json(&movie_input("Heat"))
                    .await
                    .assert_status(StatusCode::UNAUTHORIZED);

                let (user, roles) = viewer();
                server
                    .post("/movies")
                    .add_header(USER_ID_HEADER, user.to_string())
                    .add_header(USER_ROLES_HEADER, roles)
                    .json(&movie_input("Heat"))
                    .await
                    .assert_status(StatusCode::FORBIDDEN);
            }

            #[tokio::test]
            async fn test_create_update_delete() {
                let server = server().await;
                let (user, roles) = admin();

                let response = server
                    .post("/movies")
                    .add_header(USER_ID_HEADER, user.to_string())
                    .add_header(USER_ROLES_HEADER, roles.clone())
                    .json(&movie_input("Heat"))
                    .await;
                response.assert_status(StatusCode::CREATED);
                let created: Value = response.json();
                let id = created["id"].as_str().unwrap().to_string();
                assert!(created["createdAt"].is_string());

                let mut replacement = movie_input("Heat (1995)");
                replacement["rating"] = json!(8.3);
                let response = server
                    .put(&format!("/movies/{id}"))
                    .add_header(USER_ID_HEADER, user.to_string())
                    .add_header(USER_ROLES_HEADER, roles.clone())
                    .json(&replacement)
                    .await;
                response.assert_status_ok();
                let updated: Value = response.json();
                assert_eq!(updated["title"], "Heat (1995)");
                assert_eq!(updated["createdAt"], created["createdAt"]);

                let response = server
                    .delete(&format!("/movies/{id}"))
                    .add_header(USER_ID_HEADER, user.to_string())
                    .add_header(USER_ROLES_HEADER, roles)
                    .await;
                response.assert_status_ok();
                assert_eq!(response.json::<Value>()["message"], "Movie deleted successfully");

                server
                    .get(&format!("/movies/{id}"))
                    .await
                    .assert_status(StatusCode::NOT_FOUND);
            }

            #[tokio::test]
            async fn test_create_rejects_invalid_movie() {
                let server = server().await;
                let (user, roles) = admin();

                let mut input = movie_input("");
                input["rating"] = json!(12);
                let response = server
                    .post("/movies")
                    .add_header(USER_ID_HEADER, user.to_string())
                    .add_header(USER_ROLES_HEADER, roles.clone())
                    .json(&input)
                    .await;
                response.assert_status(StatusCode::BAD_REQUEST);
                assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");

                let response = server
                    .post("/movies")
                    .add_header(USER_ID_HEADER, user.to_string())
                    .add_header(USER_ROLES_HEADER, roles)
                    .json(&json!({ "title": 42 }))
                    .await;
                response.assert_status(StatusCode::BAD_REQUEST);
                assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");
            }

            #[tokio::test]
            async fn test_update_missing_movie() {
                let server = server().await;
                let (user, roles) = admin();
                let response = server
                    .put("/movies/77")
                    .add_header(USER_ID_HEADER, user.to_string())
                    .add_header(USER_ROLES_HEADER, roles)
                    .json(&movie_input("Ghost"))
                    .await;
                response.assert_status(StatusCode::NOT_FOUND);
            }

            #[tokio::test]
            async fn test_malformed_user_header() {
                let server = server().await;
                let response = server
                    .get("/users/favorites")
                    .add_header(USER_ID_HEADER, "not-a-uuid")
                    .await;
                response.assert_status(StatusCode::BAD_REQUEST);
                assert_eq!(response.json::<Value>()["code"], "INVALID_HEADER");
            }

            // =================================================================
            // Profiles and favorites
            // =================================================================

            #[tokio::test]
            async fn test_profile_roundtrip() {
                let server = server().await;
                let (user, _) = viewer();

                let response = server
                    .get("/users/profile")
                    .add_header(USER_ID_HEADER, user.to_string())
                    .await;
                response.assert_status(StatusCode::NOT_FOUND);
                assert_eq!(response.json::<Value>()["code"], "USER_NOT_FOUND");

                create_profile(&server, &user).await;

                let response = server
                    .get("/users/profile")
                    .add_header(USER_ID_HEADER, user.to_string())
                    .await;
                response.assert_status_ok();
                let body: Value = response.json();
                assert_eq!(body["email"], "fan@example.com");
                assert_eq!(body["favorites"], json!([]));
            }

            #[tokio::test]
            async fn test_profile_validation() {
                let server = server().await;
                let (user, _) = viewer();
                let response = server
                    .put("/users/profile")
                    .add_header(USER_ID_HEADER, user.to_string())
                    .json(&json!({ "username": "ab", "email": "nope" }))
                    .await;
                response.assert_status(StatusCode::BAD_REQUEST);
                assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");
            }

            #[tokio::test]
            async fn test_favorites_flow() {
                let server = server_with(scenario_catalog()).await;
                let (user, _) = viewer();
                create_profile(&server, &user).await;

                let response = server
                    .post("/movies/3/favorite")
                    .add_header(USER_ID_HEADER, user.to_string())
                    .await;
                response.assert_status_ok();
                let body: Value = response.json();
                assert_eq!(body["message"], "Added to favorites");
                assert_eq!(body["favorites"], json!([3]));

                server
                    .post("/movies/1/favorite")
                    .add_header(USER_ID_HEADER, user.to_string())
                    .await
                    .assert_status_ok();

                let response = server
                    .post("/movies/3/favorite")
                    .add_header(USER_ID_HEADER, user.to_string())
                    .await;
                response.assert_status(StatusCode::BAD_REQUEST);
                assert_eq!(response.json::<Value>()["code"], "ALREADY_FAVORITED");

                let response = server
                    .get("/users/favorites")
                    .add_header(USER_ID_HEADER, user.to_string())
                    .await;
                response.assert_status_ok();
                let titles: Vec<Value> = response
                    .json::<Value>()
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|m| m["title"].clone())
                    .collect();
                assert_eq!(titles, vec![json!("Cedar"), json!("Amber")]);

                let response = server
                    .delete("/movies/3/favorite")
                    .add_header(USER_ID_HEADER, user.to_string())
                    .await;
                response.assert_status_ok();
                let body: Value = response.json();
                assert_eq!(body["message"], "Removed from favorites");
                assert_eq!(body["favorites"], json!([1]));
            }

            #[tokio::test]
            async fn test_favorite_requires_identity_and_movie() {
                let server = server().await;
                let (user, _) = viewer();

                server
                    .post("/movies/1/favorite")
                    .await
                    .assert_status(StatusCode::UNAUTHORIZED);

                let response = server
                    .post("/movies/1/favorite")
                    .add_header(USER_ID_HEADER, user.to_string())
                    .await;
                response.assert_status(StatusCode::NOT_FOUND);
                assert_eq!(response.json::<Value>()["code"], "MOVIE_NOT_FOUND");
            }

            #[tokio::test]
            async fn test_favorite_without_profile() {
                let server = server_with(scenario_catalog()).await;
                let (user, _) = viewer();
                let response = server
                    .post("/movies/1/favorite")
                    .add_header(USER_ID_HEADER, user.to_string())
                    .await;
                response.assert_status(StatusCode::NOT_FOUND);
                assert_eq!(response.json::<Value>()["code"], "USER_NOT_FOUND");
            }

            // =================================================================
            // Reviews
            // =================================================================

            async fn post_review(
                server: &TestServer,
                user: &uuid::Uuid,
                movie: &str,
                body: Value,
            ) -> axum_test::TestResponse {
                server
                    .post(&format!("/movies/{movie}/reviews"))
                    .add_header(USER_ID_HEADER, user.to_string())
                    .json(&body)
                    .await
            }

            #[tokio::test]
            async fn test_review_requires_identity_profile_and_movie() {
                let server = server_with(scenario_catalog()).await;
                let (user, _) = viewer();
                let body = json!({ "rating": 8, "comment": "Tense" });

                server
                    .post("/movies/1/reviews")
                    .json(&body)
                    .await
                    .assert_status(StatusCode::UNAUTHORIZED);

                let response = post_review(&server, &user, "1", body.clone()).await;
                response.assert_status(StatusCode::NOT_FOUND);
                assert_eq!(response.json::<Value>()["code"], "USER_NOT_FOUND");

                create_profile(&server, &user).await;
                let response = post_review(&server, &user, "404", body).await;
                response.assert_status(StatusCode::NOT_FOUND);
                assert_eq!(response.json::<Value>()["code"], "MOVIE_NOT_FOUND");
            }

            #[tokio::test]
            async fn test_reviews_update_movie_average() {
                let server = server_with(scenario_catalog()).await;
                let (ana, _) = viewer();
                let (bo, _) = viewer();
                create_profile(&server, &ana).await;
                create_profile(&server, &bo).await;

                let response =
                    post_review(&server, &ana, "1", json!({ "rating": 7, "comment": " Slow " }))
                        .await;
                response.assert_status(StatusCode::CREATED);
                let body: Value = response.json();
                assert_eq!(body["review"]["movieId"], json!(1));
                assert_eq!(body["review"]["username"], "cinephile");
                assert_eq!(body["review"]["comment"], "Slow");
                assert_eq!(body["movie"]["reviewCount"], 1);
                assert_eq!(body["movie"]["averageRating"], json!(7.0));

                let response =
                    post_review(&server, &bo, "1", json!({ "rating": 8, "comment": "Sharp" }))
                        .await;
                response.assert_status(StatusCode::CREATED);
                let body: Value = response.json();
                assert_eq!(body["movie"]["reviewCount"], 2);
                assert_eq!(body["movie"]["averageRating"], json!(7.5));

                let movie: Value = server.get("/movies/1").await.json();
                assert_eq!(movie["averageRating"], json!(7.5));
                assert_eq!(movie["reviewCount"], 2);

                let response = server.get("/movies/1/reviews").await;
                response.assert_status_ok();
                let comments: Vec<Value> = response
                    .json::<Value>()
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|r| r["comment"].clone())
                    .collect();
                assert_eq!(comments, vec![json!("Slow"), json!("Sharp")]);
            }

            #[tokio::test]
            async fn test_second_review_of_same_movie_is_rejected() {
                let server = server_with(scenario_catalog()).await;
                let (user, _) = viewer();
                create_profile(&server, &user).await;

                post_review(&server, &user, "2", json!({ "rating": 9, "comment": "Great" }))
                    .await
                    .assert_status(StatusCode::CREATED);
                let response =
                    post_review(&server, &user, "2", json!({ "rating": 1, "comment": "Again" }))
                        .await;
                response.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = response.json();
                assert_eq!(body["code"], "ALREADY_REVIEWED");
                assert_eq!(body["details"]["movie_id"], "2");

                let movie: Value = server.get("/movies/2").await.json();
                assert_eq!(movie["reviewCount"], 1);
                assert_eq!(movie["averageRating"], json!(9.0));
            }

            #[tokio::test]
            async fn test_review_validation() {
                let server = server_with(scenario_catalog()).await;
                let (user, _) = viewer();
                create_profile(&server, &user).await;

                for body in [
                    json!({ "rating": 11, "comment": "Too much" }),
                    json!({ "rating": 5, "comment": "   " }),
                    json!({ "rating": "five", "comment": "Typed" }),
                ] {
                    let response = post_review(&server, &user, "1", body.clone()).await;
                    response.assert_status(StatusCode::BAD_REQUEST);
                    assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR", "{body}");
                }

                let reviews: Value = server.get("/movies/1/reviews").await.json();
                assert_eq!(reviews, json!([]));
            }

            #[tokio::test]
            async fn test_user_reviews_and_cascade_on_delete() {
                let server = server_with(scenario_catalog()).await;
                let (user, _) = viewer();
                create_profile(&server, &user).await;

                server
                    .get("/movies/404/reviews")
                    .await
                    .assert_status(StatusCode::NOT_FOUND);

                for movie in ["3", "1"] {
                    post_review(&server, &user, movie, json!({ "rating": 6, "comment": "Fine" }))
                        .await
                        .assert_status(StatusCode::CREATED);
                }

                let response = server
                    .get("/users/reviews")
                    .add_header(USER_ID_HEADER, user.to_string())
                    .await;
                response.assert_status_ok();
                let movies: Vec<Value> = response
                    .json::<Value>()
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|r| r["movieId"].clone())
                    .collect();
                assert_eq!(movies, vec![json!(3), json!(1)]);

                let (admin_id, roles) = admin();
                server
                    .delete("/movies/3")
                    .add_header(USER_ID_HEADER, admin_id.to_string())
                    .add_header(USER_ROLES_HEADER, roles)
                    .await
                    .assert_status_ok();

                let reviews: Value = server
                    .get("/users/reviews")
                    .add_header(USER_ID_HEADER, user.to_string())
                    .await
                    .json();
                assert_eq!(reviews.as_array().unwrap().len(), 1);
                assert_eq!(reviews[0]["movieId"], json!(1));

                let (stranger, _) = viewer();
                let response = server
                    .get("/users/reviews")
                    .add_header(USER_ID_HEADER, stranger.to_string())
                    .await;
                response.assert_status(StatusCode::NOT_FOUND);
                assert_eq!(response.json::<Value>()["code"], "USER_NOT_FOUND");
            }
        }
    };
}
