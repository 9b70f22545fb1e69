#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use hirelist::{
    ApiRequest, ListController, ListError, ListOptions, MemoryLocation, Page, Pagination,
    RecruiterFilters, Result, Transport, recruiter_defaults,
};
use parking_lot::Mutex;
use tokio::sync::oneshot;

struct Call<T> {
    request: ApiRequest,
    reply: Option<oneshot::Sender<Result<Page<T>>>>,
}

/// Transport whose responses are handed out by the test, in any order.
pub struct MockTransport<T> {
    calls: Mutex<Vec<Call<T>>>,
}

impl<T> MockTransport<T> {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Number of fetches started so far
    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn request(&self, index: usize) -> ApiRequest {
        self.calls.lock()[index].request.clone()
    }

    pub fn last_request(&self) -> ApiRequest {
        let calls = self.calls.lock();
        calls.last().expect("no request was issued").request.clone()
    }

    pub fn respond(&self, index: usize, page: Page<T>) {
        self.reply(index, Ok(page));
    }

    pub fn fail(&self, index: usize, error: ListError) {
        self.reply(index, Err(error));
    }

    fn reply(&self, index: usize, result: Result<Page<T>>) {
        let sender = self.calls.lock()[index]
            .reply
            .take()
            .expect("request already answered");
        // The fetch task may have been aborted by unmount
        let _ = sender.send(result);
    }
}

impl<T: Send + 'static> Transport<T> for MockTransport<T> {
    fn fetch<'a>(&'a self, request: &'a ApiRequest) -> BoxFuture<'a, Result<Page<T>>> {
        let (tx, rx) = oneshot::channel();
        self.calls.lock().push(Call {
            request: request.clone(),
            reply: Some(tx),
        });
        Box::pin(async move {
            rx.await
                .unwrap_or_else(|_| Err(ListError::Config("mock reply dropped".to_string())))
        })
    }
}

pub fn page_of(items: &[&str], total_items: u64, total_pages: u32, page: u32) -> Page<String> {
    Page {
        data: items.iter().map(|s| s.to_string()).collect(),
        pagination: Pagination {
            total_items,
            total_pages,
            page,
            page_size: 25,
        },
    }
}

pub fn server_error() -> ListError {
    ListError::Api {
        status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
        message: "maintenance".to_string(),
    }
}

pub struct Screen {
    pub transport: Arc<MockTransport<String>>,
    pub location: Arc<MemoryLocation>,
    pub controller: ListController<RecruiterFilters, String>,
}

/// Mount the recruiter screen at `query` against a scripted transport.
pub async fn mount_at(query: &str, options: ListOptions<RecruiterFilters>) -> Screen {
    let transport = Arc::new(MockTransport::new());
    let location = Arc::new(MemoryLocation::new(query));
    let controller = ListController::mount(transport.clone(), location.clone(), options);
    settle().await;

    Screen {
        transport,
        location,
        controller,
    }
}

pub async fn mount(query: &str) -> Screen {
    mount_at(query, ListOptions::new(recruiter_defaults(25))).await
}

/// Let every runnable task finish its current step.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
