use cellar::errors::ErrorKind;
use cellar::multi_store::MultiStore;
use cellar::store::{
    BasicEngine, MemoryEngine, StoreEventListener, StoreEvents, StoreOptions, StoreProvider,
    BASIC_ENGINE, MEMORY_ENGINE,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[ctor::ctor]
fn init() {
    colog::init();
}

fn create_multi_store() -> MultiStore {
    let multi = MultiStore::new("/data/cellar");
    multi.register_engine(MemoryEngine::create_engine()).unwrap();
    multi.register_engine(BasicEngine::create_engine()).unwrap();
    multi
}

#[test]
fn test_multi_store_lifecycle() {
    let multi = create_multi_store();
    multi.start().unwrap();

    let users = multi
        .create_store("users", MEMORY_ENGINE, &StoreOptions::new())
        .unwrap();
    let sessions = multi
        .create_store("sessions", BASIC_ENGINE, &StoreOptions::new())
        .unwrap();

    users.set(b"u1", b"alice").unwrap();
    sessions.set(b"s1", b"token").unwrap();

    assert_eq!(multi.store_count(), 2);
    assert_eq!(
        multi.get_store("users").unwrap().get(b"u1").unwrap(),
        b"alice"
    );

    multi.stop().unwrap();
    assert_eq!(multi.store_count(), 0);
    assert!(users.is_closed().unwrap());
    assert!(sessions.is_closed().unwrap());
}

#[test]
fn test_engine_registry_through_multi_store() {
    let multi = create_multi_store();
    assert_eq!(multi.engines().count(), 2);
    assert!(multi.engines().has(MEMORY_ENGINE));
    assert!(multi.engines().has(BASIC_ENGINE));

    // Duplicate engine registration is rejected.
    let err = multi
        .register_engine(MemoryEngine::create_engine())
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::EngineExists);
}

#[test]
fn test_default_engine_selection() {
    let multi = create_multi_store();
    assert_eq!(multi.default_engine(), Some(MEMORY_ENGINE.to_string()));

    // Empty engine name resolves to the default.
    let store = multi.create_store("d", "", &StoreOptions::new()).unwrap();
    assert!(store.transactional().is_some());

    multi.set_default_engine(BASIC_ENGINE).unwrap();
    let store = multi.create_store("e", "", &StoreOptions::new()).unwrap();
    assert!(store.transactional().is_none());
}

#[test]
fn test_store_names_are_globally_unique() {
    let multi = create_multi_store();
    multi
        .create_store("users", MEMORY_ENGINE, &StoreOptions::new())
        .unwrap();

    let err = multi
        .create_store("users", BASIC_ENGINE, &StoreOptions::new())
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::StoreExists);
}

#[test]
fn test_delete_store_closes_and_unmanages() {
    let multi = create_multi_store();
    let store = multi
        .create_store("temp", "", &StoreOptions::new())
        .unwrap();

    multi.delete_store("temp").unwrap();
    assert!(store.is_closed().unwrap());
    assert!(multi.get_store("temp").is_none());
    assert_eq!(
        multi.delete_store("temp").unwrap_err().kind(),
        &ErrorKind::StoreNotFound
    );
}

#[test]
fn test_event_notifications_cover_lifecycle() {
    let multi = create_multi_store();
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();

    multi
        .subscribe(StoreEventListener::new(move |info| {
            events_clone
                .lock()
                .push((info.event(), info.store_name().to_string()));
            Ok(())
        }))
        .unwrap();

    multi
        .create_store("observed", "", &StoreOptions::new())
        .unwrap();
    multi.delete_store("observed").unwrap();
    multi
        .create_store("survivor", "", &StoreOptions::new())
        .unwrap();
    multi.close_all().unwrap();

    let seen = events.lock().clone();
    assert_eq!(
        seen,
        vec![
            (StoreEvents::Created, "observed".to_string()),
            (StoreEvents::Deleted, "observed".to_string()),
            (StoreEvents::Created, "survivor".to_string()),
            (StoreEvents::Closed, "survivor".to_string()),
        ]
    );
}

#[test]
fn test_unsubscribed_listener_receives_nothing() {
    let multi = create_multi_store();
    let count = Arc::new(AtomicUsize::new(0));
    let count_clone = count.clone();

    let subscriber = multi
        .subscribe(StoreEventListener::new(move |_| {
            count_clone.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }))
        .unwrap();
    multi.unsubscribe(subscriber).unwrap();

    multi.create_store("quiet", "", &StoreOptions::new()).unwrap();
    assert_eq!(count.load(Ordering::Relaxed), 0);
}

#[test]
fn test_concurrent_store_creation_yields_one_winner() {
    let multi = create_multi_store();
    let successes = Arc::new(AtomicUsize::new(0));

    std::thread::scope(|s| {
        for _ in 0..8 {
            let multi = multi.clone();
            let successes = successes.clone();
            s.spawn(move || {
                if multi
                    .create_store("contended", "", &StoreOptions::new())
                    .is_ok()
                {
                    successes.fetch_add(1, Ordering::Relaxed);
                }
            });
        }
    });

    assert_eq!(successes.load(Ordering::Relaxed), 1);
    assert_eq!(multi.store_count(), 1);
}

#[test]
fn test_stores_spanning_engines_are_independent() {
    let multi = create_multi_store();
    let a = multi
        .create_store("a", MEMORY_ENGINE, &StoreOptions::new())
        .unwrap();
    let b = multi
        .create_store("b", BASIC_ENGINE, &StoreOptions::new())
        .unwrap();

    a.set(b"shared_key", b"from_a").unwrap();
    b.set(b"shared_key", b"from_b").unwrap();

    assert_eq!(a.get(b"shared_key").unwrap(), b"from_a");
    assert_eq!(b.get(b"shared_key").unwrap(), b"from_b");

    multi.delete_store("a").unwrap();
    assert_eq!(b.get(b"shared_key").unwrap(), b"from_b");
}
