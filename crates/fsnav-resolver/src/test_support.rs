//! In-memory upstreams and a recording sleeper for unit tests.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use fsnav_core::{CatalogKind, NavigationTree, PagePayload, PageTarget};

use crate::poll::Sleeper;
use crate::source::{HandleSource, NavigationSource, PageSource};

#[derive(Debug, Clone, thiserror::Error)]
#[error("fake upstream failure: {0}")]
pub(crate) struct FakeError(pub String);

pub(crate) fn sample_tree() -> NavigationTree {
    serde_json::from_value(json!({
        "idMap": {
            "home": {
                "id": "home",
                "label": "Home",
                "seoRoute": "/Homepage.json",
                "caasDocumentId": "caas-home",
                "customData": { "pageTemplate": "homepage" },
                "parentIds": []
            },
            "about": {
                "id": "about",
                "label": "About",
                "seoRoute": "/About.json",
                "caasDocumentId": "caas-about",
                "customData": { "pageTemplate": "contentpage" },
                "parentIds": []
            },
            "shoes": {
                "id": "shoes",
                "label": "Shoes",
                "seoRoute": "/[products]/Shoes.json",
                "caasDocumentId": "caas-shoes",
                "customData": { "pageTemplate": "product", "ecomShopId": "8123" },
                "parentIds": []
            }
        },
        "seoRouteMap": {
            "/Homepage.json": "home",
            "/About.json": "about",
            "/[products]/Shoes.json": "shoes"
        }
    }))
    .expect("sample navigation should deserialize")
}

/// Tree with `sample_tree` plus one extra element.
pub(crate) fn tree_with(id: &str, element: serde_json::Value) -> NavigationTree {
    let mut tree = sample_tree();
    let element = serde_json::from_value(element).expect("element should deserialize");
    tree.id_map.insert(id.to_string(), element);
    tree
}

/// Navigation source that replays a script of responses. Once the script is
/// exhausted the last response repeats.
#[derive(Default)]
pub(crate) struct FakeNavigation {
    script: Mutex<VecDeque<Result<NavigationTree, FakeError>>>,
    last: Mutex<Option<Result<NavigationTree, FakeError>>>,
    calls: AtomicU32,
    locales: Mutex<Vec<String>>,
}

impl FakeNavigation {
    pub(crate) fn always(tree: NavigationTree) -> Self {
        Self::scripted(vec![Ok(tree)])
    }

    pub(crate) fn scripted(script: Vec<Result<NavigationTree, FakeError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn locales(&self) -> Vec<String> {
        self.locales.lock().unwrap().clone()
    }

    fn next(&self) -> Result<NavigationTree, FakeError> {
        let mut last = self.last.lock().unwrap();
        if let Some(response) = self.script.lock().unwrap().pop_front() {
            *last = Some(response);
        }
        last.clone()
            .unwrap_or_else(|| Err(FakeError("no scripted response".to_string())))
    }
}

impl NavigationSource for FakeNavigation {
    type Error = FakeError;

    fn fetch_tree(
        &self,
        cms_locale: &str,
    ) -> impl Future<Output = Result<NavigationTree, FakeError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.locales.lock().unwrap().push(cms_locale.to_string());
        std::future::ready(self.next())
    }
}

#[derive(Default)]
pub(crate) struct FakePages {
    elements: HashMap<String, PagePayload>,
    pages: HashMap<String, PagePayload>,
    requests: Mutex<Vec<String>>,
}

impl FakePages {
    pub(crate) fn with_element(mut self, caas_id: &str) -> Self {
        self.elements.insert(caas_id.to_string(), payload(caas_id));
        self
    }

    pub(crate) fn with_page(mut self, id: &str) -> Self {
        self.pages.insert(id.to_string(), payload(&format!("page-{id}")));
        self
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

pub(crate) fn payload(id: &str) -> PagePayload {
    serde_json::from_value(json!({
        "id": id,
        "children": [
            { "name": "stage", "children": [ { "id": format!("{id}-banner"), "sectionType": "banner" } ] },
            { "name": "content", "children": [] }
        ]
    }))
    .expect("payload should deserialize")
}

impl PageSource for FakePages {
    type Error = FakeError;

    fn fetch_page(
        &self,
        target: &PageTarget,
    ) -> impl Future<Output = Result<Option<PagePayload>, FakeError>> + Send {
        let id = target.id.clone().unwrap_or_default();
        self.requests.lock().unwrap().push(format!("page:{id}"));
        let result = if id == "broken" {
            Err(FakeError("page backend down".to_string()))
        } else {
            Ok(self.pages.get(&id).cloned())
        };
        std::future::ready(result)
    }

    fn fetch_element(
        &self,
        caas_document_id: &str,
        cms_locale: &str,
    ) -> impl Future<Output = Result<Option<PagePayload>, FakeError>> + Send {
        self.requests
            .lock()
            .unwrap()
            .push(format!("element:{caas_document_id}:{cms_locale}"));
        std::future::ready(Ok(self.elements.get(caas_document_id).cloned()))
    }
}

#[derive(Default)]
pub(crate) struct FakeHandles {
    handles: HashMap<(CatalogKind, String), String>,
    calls: AtomicU32,
}

impl FakeHandles {
    pub(crate) fn with(mut self, kind: CatalogKind, id: &str, handle: &str) -> Self {
        self.handles.insert((kind, id.to_string()), handle.to_string());
        self
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HandleSource for FakeHandles {
    fn lookup_handle(
        &self,
        id: &str,
        kind: CatalogKind,
    ) -> impl Future<Output = Option<String>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::ready(self.handles.get(&(kind, id.to_string())).cloned())
    }
}

/// Sleeper that returns immediately and records every requested delay.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub(crate) fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        self.slept.lock().unwrap().push(duration);
        std::future::ready(())
    }
}

/// Sleeper that never wakes up.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct StalledSleeper;

impl Sleeper for StalledSleeper {
    fn sleep(&self, _duration: Duration) -> impl Future<Output = ()> + Send {
        std::future::pending()
    }
}
