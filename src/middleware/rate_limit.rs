use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

const WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct Window {
    opened: Instant,
    used: u32,
}

/// Fixed-window request throttle, one per router group.
#[derive(Clone, Debug)]
pub struct Throttle {
    limit: u32,
    window: Arc<Mutex<Window>>,
}

impl Throttle {
    pub fn per_second(limit: u32) -> Self {
        Self {
            limit: limit.max(1),
            window: Arc::new(Mutex::new(Window {
                opened: Instant::now(),
                used: 0,
            })),
        }
    }

    fn try_acquire(&self) -> bool {
        let mut win = self.window.lock().expect("throttle mutex poisoned");
        if win.opened.elapsed() >= WINDOW {
            win.opened = Instant::now();
            win.used = 0;
        }
        if win.used >= self.limit {
            return false;
        }
        win.used += 1;
        true
    }
}

pub async fn throttle_middleware(
    State(throttle): State<Throttle>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !throttle.try_acquire() {
        return (StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded").into_response();
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttle_caps_a_window_and_then_recovers() {
        let throttle = Throttle::per_second(2);
        assert!(throttle.try_acquire());
        assert!(throttle.try_acquire());
        assert!(!throttle.try_acquire());

        // force the window to look expired
        throttle.window.lock().unwrap().opened = Instant::now() - Duration::from_secs(2);
        assert!(throttle.try_acquire());
    }
}
