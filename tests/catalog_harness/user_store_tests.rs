//! Generic contract tests for any `UserStore` implementation
//!
//! Invoke `user_store_tests!(factory_expr)` where `factory_expr` is an async
//! expression returning a fresh, empty store.

/// Generate the full `UserStore` contract test suite
#[macro_export]
macro_rules! user_store_tests {
    ($factory:expr) => {
        mod user_store_contract_tests {
            use super::*;
            use marquee::core::error::{CatalogError, FavoriteError, UserError};
            use marquee::core::movie::MovieId;
            use marquee::core::service::UserStore;
            use marquee::core::user::UserRecord;
            use uuid::Uuid;

            async fn saved_user(store: &impl UserStore) -> UserRecord {
                store
                    .save(UserRecord::new(Uuid::new_v4(), "cinephile", "fan@example.com"))
                    .await
                    .unwrap()
            }

            #[tokio::test]
            async fn test_save_and_get() {
                let store = $factory;
                let user = saved_user(&store).await;

                let found = store.get(&user.id).await.unwrap().unwrap();
                assert_eq!(found.username, "cinephile");
                assert_eq!(found.email, "fan@example.com");
                assert!(found.favorites.is_empty());
            }

            #[tokio::test]
            async fn test_get_unknown_user() {
                let store = $factory;
                assert!(store.get(&Uuid::new_v4()).await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_save_replaces_existing() {
                let store = $factory;
                let mut user = saved_user(&store).await;
                user.username = "projectionist".to_string();
                store.save(user.clone()).await.unwrap();

                let found = store.get(&user.id).await.unwrap().unwrap();
                assert_eq!(found.username, "projectionist");
            }

            #[tokio::test]
            async fn test_add_favorites_in_order() {
                let store = $factory;
                let user = saved_user(&store).await;

                store.add_favorite(&user.id, MovieId::Numeric(3)).await.unwrap();
                let updated = store
                    .add_favorite(&user.id, MovieId::Text("abc".into()))
                    .await
                    .unwrap();
                assert_eq!(
                    updated.favorites,
                    vec![MovieId::Numeric(3), MovieId::Text("abc".into())]
                );

                let found = store.get(&user.id).await.unwrap().unwrap();
                assert_eq!(found.favorites, updated.favorites);
            }

            #[tokio::test]
            async fn test_add_duplicate_favorite_fails() {
                let store = $factory;
                let user = saved_user(&store).await;
                store.add_favorite(&user.id, MovieId::Numeric(3)).await.unwrap();

                let err = store
                    .add_favorite(&user.id, MovieId::Numeric(3))
                    .await
                    .unwrap_err();
                assert!(matches!(
                    err,
                    CatalogError::Favorite(FavoriteError::AlreadyFavorited { .. })
                ));

                let found = store.get(&user.id).await.unwrap().unwrap();
                assert_eq!(found.favorites, vec![MovieId::Numeric(3)]);
            }

            #[tokio::test]
            async fn test_add_favorite_unknown_user() {
                let store = $factory;
                let err = store
                    .add_favorite(&Uuid::new_v4(), MovieId::Numeric(1))
                    .await
                    .unwrap_err();
                assert!(matches!(
                    err,
                    CatalogError::User(UserError::NotFound { .. })
                ));
            }

            #[tokio::test]
            async fn test_remove_favorite() {
                let store = $factory;
                let user = saved_user(&store).await;
                for id in [1, 2, 3] {
                    store.add_favorite(&user.id, MovieId::Numeric(id)).await.unwrap();
                }

                let updated = store
                    .remove_favorite(&user.id, &MovieId::Numeric(2))
                    .await
                    .unwrap();
                assert_eq!(updated.favorites, vec![MovieId::Numeric(1), MovieId::Numeric(3)]);
            }

            #[tokio::test]
            async fn test_remove_absent_favorite_is_noop() {
                let store = $factory;
                let user = saved_user(&store).await;
                store.add_favorite(&user.id, MovieId::Numeric(1)).await.unwrap();

                let updated = store
                    .remove_favorite(&user.id, &MovieId::Numeric(99))
                    .await
                    .unwrap();
                assert_eq!(updated.favorites, vec![MovieId::Numeric(1)]);
            }

            #[tokio::test]
            async fn test_remove_favorite_unknown_user() {
                let store = $factory;
                let err = store
                    .remove_favorite(&Uuid::new_v4(), &MovieId::Numeric(1))
                    .await
                    .unwrap_err();
                assert!(matches!(
                    err,
                    CatalogError::User(UserError::NotFound { .. })
                ));
            }
        }
    };
}
