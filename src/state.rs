use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
};

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::Key;
use diesel::{
    SqliteConnection,
    connection::TransactionManager,
    r2d2::{ConnectionManager, Pool, PooledConnection},
};

use crate::{config::Settings, util_resp::FailureResponse};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

type PooledConn = PooledConnection<ConnectionManager<SqliteConnection>>;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub pool: DbPool,
    pub key: Key,
    pub settings: Arc<Settings>,
}

/// Slot for the transactional connection of the current request. It is put
/// into the request extensions by [`tx_commit_layer`] and filled the first
/// time a handler asks for a [`Conn<true>`].
#[derive(Clone, Default)]
struct TxSlot(Arc<std::sync::Mutex<Option<ThreadSafeConn<true>>>>);

/// This middleware commits opened transactions after each request has been
/// handled (or rolls them back if the handler did not succeed).
pub async fn tx_commit_layer(mut request: Request, next: Next) -> Response {
    let slot = TxSlot::default();
    request.extensions_mut().insert(slot.clone());

    let response = next.run(request).await;

    let opened = match slot.0.lock() {
        Ok(mut guard) => guard.take(),
        Err(_) => None,
    };

    if let Some(conn) = opened {
        let mut conn = conn.inner.lock().await;
        let status = response.status();
        let ret = if status.is_success()
            || status.is_redirection()
            || status.is_informational()
        {
            <PooledConn as diesel::Connection>::TransactionManager::commit_transaction(&mut *conn)
        } else {
            <PooledConn as diesel::Connection>::TransactionManager::rollback_transaction(&mut *conn)
        };

        if let Err(e) = ret {
            tracing::error!("failed to finish request transaction: {e}");
            return FailureResponse::ServerError(()).into_response();
        }
    }

    response
}

pub struct Conn<const TX: bool> {
    inner: tokio::sync::OwnedMutexGuard<PooledConn>,
}

impl<const TX: bool> Deref for Conn<TX> {
    type Target = PooledConn;

    fn deref(&self) -> &Self::Target {
        self.inner.deref()
    }
}

impl<const TX: bool> DerefMut for Conn<TX> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.deref_mut()
    }
}

#[async_trait]
impl<const TX: bool, S> FromRequestParts<S> for Conn<TX>
where
    S: Send + Sync,
    DbPool: FromRef<S>,
{
    type Rejection = FailureResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let conn = ThreadSafeConn::<TX>::from_request_parts(parts, state).await?;
        Ok(Conn {
            inner: conn.inner.lock_owned().await,
        })
    }
}

#[derive(Clone)]
pub struct ThreadSafeConn<const TX: bool> {
    pub inner: Arc<tokio::sync::Mutex<PooledConn>>,
}

#[async_trait]
impl<const TX: bool, S> FromRequestParts<S> for ThreadSafeConn<TX>
where
    S: Send + Sync,
    DbPool: FromRef<S>,
{
    type Rejection = FailureResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let slot = if TX {
            parts.extensions.get::<TxSlot>().cloned()
        } else {
            None
        };

        if let Some(slot) = &slot {
            let existing = slot
                .0
                .lock()
                .map_err(|_| FailureResponse::ServerError(()))?
                .clone();
            if let Some(existing) = existing {
                return Ok(ThreadSafeConn {
                    inner: existing.inner,
                });
            }
        }

        let pool = DbPool::from_ref(state);
        let mut conn = tokio::task::spawn_blocking(move || pool.get())
            .await
            .map_err(|e| {
                tracing::error!("connection checkout task failed: {e}");
                FailureResponse::ServerError(())
            })?
            .map_err(|e| {
                tracing::error!("could not get a database connection: {e}");
                FailureResponse::ServerError(())
            })?;

        let Some(slot) = slot else {
            if TX {
                // Without the commit layer nobody would finish the
                // transaction, so hand out a plain connection instead.
                tracing::warn!("transactional connection requested outside of tx_commit_layer");
            }
            return Ok(ThreadSafeConn {
                inner: Arc::new(tokio::sync::Mutex::new(conn)),
            });
        };

        <PooledConn as diesel::Connection>::TransactionManager::begin_transaction(&mut conn)
            .map_err(FailureResponse::from)?;

        let t = ThreadSafeConn::<true> {
            inner: Arc::new(tokio::sync::Mutex::new(conn)),
        };
        *slot
            .0
            .lock()
            .map_err(|_| FailureResponse::ServerError(()))? = Some(t.clone());

        Ok(ThreadSafeConn { inner: t.inner })
    }
}
