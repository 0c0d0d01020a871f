mod common;

use std::fs;

use blurg_core::api::RemoteClient;
use blurg_core::factory::{create_local_remote_diary, create_remote_diary, get_diary};
use blurg_core::server::LoopbackTransport;
use blurg_core::{ConfigError, DiaryError, DiaryKind, DiaryTarget, EntryStore, Verification};
use common::{Harness, BAD_URL, URL, USER};

#[test]
fn test_create_remote_diary_registers_and_caches_key() {
    let h = Harness::new();

    let diary = create_remote_diary("remote", &h.config, URL, USER).expect("create should succeed");

    assert_eq!(h.server_diaries(), 1);
    assert!(h.config.has_diary(&diary).unwrap());
    let key = fs::read_to_string(h.basedir().join("remote").join("key")).unwrap();
    assert_eq!(key, diary.get_diarykey());

    let params = diary.params();
    assert_eq!(params["base_url"], URL);
    assert_eq!(params["username"], USER);
    assert_eq!(params["key"], diary.get_diarykey());
}

#[cfg(unix)]
#[test]
fn test_key_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let h = Harness::new();
    create_remote_diary("remote", &h.config, URL, USER).unwrap();

    let mode = fs::metadata(h.basedir().join("remote").join("key"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_get_diaries_lists_both_kinds() {
    let h = Harness::new();
    get_diary("diary2", &h.config).unwrap();
    create_remote_diary("remote", &h.config, URL, USER).unwrap();

    let (local, remote) = h.config.get_diaries().unwrap();
    assert_eq!(local.len(), 2);
    assert_eq!(remote.len(), 1);
    assert_eq!(remote[0].name(), "remote");
}

#[test]
fn test_remote_entries_round_trip() {
    let h = Harness::new();
    let diary = create_remote_diary("remote", &h.config, URL, USER).unwrap();

    let first = diary.add_entry("Text 1").unwrap();
    let second = diary.add_entry("Text 2").unwrap();
    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);

    diary.remove_entry(first.id).unwrap();
    let entries = diary.get_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].text, "Text 2");

    assert!(matches!(
        diary.remove_entry(first.id),
        Err(DiaryError::EntryNotFound(1))
    ));
    assert!(matches!(diary.add_entry(" "), Err(DiaryError::EmptyEntry)));
}

#[test]
fn test_remote_diary_resolves_after_reopen() {
    let h = Harness::new();
    let diary = create_remote_diary("remote", &h.config, URL, USER).unwrap();
    diary.add_entry("Text 1").unwrap();

    let reopened = h.reopen();
    let found = get_diary("remote", &reopened).unwrap();
    assert_eq!(found.kind(), DiaryKind::Remote);
    assert_eq!(found.get_entries().unwrap()[0].text, "Text 1");
}

#[test]
fn test_reserved_remote_names_never_reach_server() {
    let h = Harness::new();

    for name in ["default", "config"] {
        assert!(matches!(
            create_remote_diary(name, &h.config, URL, USER),
            Err(DiaryError::ReservedName(_))
        ));
        assert!(matches!(
            create_remote_diary(name, &h.config, BAD_URL, USER),
            Err(DiaryError::ReservedName(_))
        ));
    }
    assert_eq!(h.server_diaries(), 0);
}

#[test]
fn test_remote_name_collisions() {
    let h = Harness::new();
    get_diary("diary2", &h.config).unwrap();
    create_remote_diary("remote", &h.config, URL, USER).unwrap();

    assert!(matches!(
        create_remote_diary("diary2", &h.config, URL, USER),
        Err(DiaryError::AlreadyExists(_))
    ));
    assert!(matches!(
        create_remote_diary("remote", &h.config, URL, USER),
        Err(DiaryError::AlreadyExists(_))
    ));
    assert_eq!(h.server_diaries(), 1);
}

#[test]
fn test_bad_connection_is_diary_error() {
    let h = Harness::new();

    let result = create_remote_diary("remote", &h.config, BAD_URL, USER);

    assert!(matches!(result, Err(DiaryError::Unreachable(_))));
    assert!(!h.config.has_diary("remote").unwrap());
    assert!(!h.basedir().join("remote").exists());
}

#[test]
fn test_create_local_remote_diary_uses_existing_key() {
    let h = Harness::new();
    let transport = LoopbackTransport::new(URL, h.server.clone());
    let key = RemoteClient::new(URL, std::sync::Arc::new(transport))
        .init("shared", USER)
        .unwrap();

    let diary = create_local_remote_diary("shared", &key, USER, &h.config, URL).unwrap();
    diary.add_entry("from here").unwrap();

    assert_eq!(h.server_diaries(), 1);
    assert_eq!(diary.get_diarykey(), key);
    assert_eq!(
        diary.verify().unwrap(),
        Verification::Valid {
            diaryname: "shared".to_string()
        }
    );
}

#[test]
fn test_create_local_remote_diary_validation() {
    let h = Harness::new();

    assert!(matches!(
        create_local_remote_diary("shared", "  ", USER, &h.config, URL),
        Err(DiaryError::EmptyKey)
    ));
    assert!(matches!(
        create_local_remote_diary("default", "abc", USER, &h.config, URL),
        Err(DiaryError::ReservedName(_))
    ));
    assert!(!h.config.has_diary("shared").unwrap());
}

#[test]
fn test_delete_remote_diary_wipes_server() {
    let h = Harness::new();
    let diary = create_remote_diary("remote", &h.config, URL, USER).unwrap();
    diary.add_entry("Text 1").unwrap();

    h.config.delete_diary(&diary).unwrap();

    assert_eq!(h.server_diaries(), 0);
    assert!(!h.basedir().join("remote").exists());
    assert!(!h.config.has_diary("remote").unwrap());
    assert_eq!(diary.verify().unwrap(), Verification::Invalid);
}

#[test]
fn test_promote_moves_entries_in_order() {
    let h = Harness::new();
    let local = get_diary("test_diary", &h.config).unwrap();
    local.add_entry("Text 1").unwrap();
    local.add_entry("Text 2").unwrap();
    local.add_entry("Text 3").unwrap();

    let remote = h.config.promote_diary("test_diary", URL, USER).unwrap();

    let texts: Vec<String> = remote
        .get_entries()
        .unwrap()
        .into_iter()
        .map(|e| e.text)
        .collect();
    assert_eq!(texts, vec!["Text 1", "Text 2", "Text 3"]);
    assert!(!h.basedir().join("test_diary").join("entries.sqlite").exists());
    assert!(h.basedir().join("test_diary").join("key").is_file());
    assert!(h.config.has_remote_file("test_diary", None).unwrap());
    assert_eq!(
        get_diary("test_diary", &h.reopen()).unwrap().kind(),
        DiaryKind::Remote
    );
}

#[test]
fn test_promote_current_moves_pointer() {
    let h = Harness::new();
    let local = get_diary("test_diary", &h.config).unwrap();
    h.config.set_current_diary(&local).unwrap();
    local.add_entry("Text 1").unwrap();

    h.config.promote_diary("test_diary", URL, USER).unwrap();

    let current = h.config.get_current_diary().unwrap();
    assert_eq!(current.kind(), DiaryKind::Remote);
    let entries = current.get_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].text, "Text 1");
}

#[test]
fn test_promote_failures() {
    let h = Harness::new();
    create_remote_diary("remote", &h.config, URL, USER).unwrap();

    assert!(matches!(
        h.config.promote_diary("nowhere", URL, USER),
        Err(ConfigError::UnknownDiary(_))
    ));
    assert!(matches!(
        h.config.promote_diary("remote", URL, USER),
        Err(ConfigError::AlreadyRemote(_))
    ));
    assert!(matches!(
        h.config.promote_diary("config", URL, USER),
        Err(ConfigError::ReservedName(_))
    ));
}

#[test]
fn test_promote_to_unreachable_server_keeps_local_diary() {
    let h = Harness::new();
    let local = get_diary("test_diary", &h.config).unwrap();
    local.add_entry("Text 1").unwrap();

    let result = h.config.promote_diary("test_diary", BAD_URL, USER);

    assert!(matches!(
        result,
        Err(ConfigError::Diary(DiaryError::Unreachable(_)))
    ));
    assert_eq!(local.get_entries().unwrap().len(), 1);
    assert_eq!(
        get_diary("test_diary", &h.config).unwrap().kind(),
        DiaryKind::Local
    );
}

#[test]
fn test_demote_restores_entries_and_wipes_server() {
    let h = Harness::new();
    let remote = create_remote_diary("remote", &h.config, URL, USER).unwrap();
    let first = remote.add_entry("Text 1").unwrap();
    remote.add_entry("Text 2").unwrap();

    let local = h.config.demote_diary("remote").unwrap();

    let entries = local.get_entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].text, "Text 1");
    assert_eq!(entries[0].date, first.date);
    assert_eq!(entries[1].text, "Text 2");
    assert_eq!(h.server_diaries(), 0);
    assert!(!h.basedir().join("remote").join("key").exists());
    assert_eq!(
        get_diary("remote", &h.config).unwrap().kind(),
        DiaryKind::Local
    );
}

#[test]
fn test_demote_failures() {
    let h = Harness::new();
    let remote = create_remote_diary("remote", &h.config, URL, USER).unwrap();
    h.config.set_current_diary(&remote).unwrap();

    assert!(matches!(
        h.config.demote_diary("remote"),
        Err(ConfigError::DemoteCurrent(_))
    ));
    assert!(matches!(
        h.config.demote_diary("nowhere"),
        Err(ConfigError::UnknownDiary(_))
    ));
    assert!(matches!(
        h.config.demote_diary("default"),
        Err(ConfigError::NotRemote(_))
    ));
    assert_eq!(h.server_diaries(), 1);
}

#[test]
fn test_demote_with_unwritable_registry_keeps_remote_diary() {
    let h = Harness::new();
    let remote = create_remote_diary("remote", &h.config, URL, USER).unwrap();
    remote.add_entry("Text 1").unwrap();

    let registry_path = h.basedir().join("config");
    fs::remove_file(&registry_path).unwrap();
    fs::create_dir(&registry_path).unwrap();
    fs::write(registry_path.join("blocker"), "x").unwrap();

    assert!(h.config.demote_diary("remote").is_err());

    assert_eq!(h.server_diaries(), 1);
    assert!(h.config.has_remote_file("remote", None).unwrap());
    assert_eq!(remote.get_entries().unwrap().len(), 1);
    assert!(!h.basedir().join("remote").join("entries.sqlite").exists());

    fs::remove_dir_all(&registry_path).unwrap();
    let local = h
        .config
        .demote_diary("remote")
        .expect("demote should succeed once the registry is writable");
    assert_eq!(local.get_entries().unwrap()[0].text, "Text 1");
    assert_eq!(h.server_diaries(), 0);
}

#[test]
fn test_delete_with_stale_handle_keeps_promoted_diary() {
    let h = Harness::new();
    let stale = get_diary("shared", &h.config).unwrap();
    stale.add_entry("Text 1").unwrap();
    h.config.promote_diary("shared", URL, USER).unwrap();

    assert!(matches!(
        h.config.delete_diary(&stale),
        Err(ConfigError::UnknownDiary(_))
    ));
    assert_eq!(h.server_diaries(), 1);
    assert_eq!(
        get_diary("shared", &h.config).unwrap().kind(),
        DiaryKind::Remote
    );
}

#[test]
fn test_get_diaries_skips_remote_with_missing_key() {
    let h = Harness::new();
    get_diary("diary2", &h.config).unwrap();
    create_remote_diary("broken", &h.config, URL, USER).unwrap();
    create_remote_diary("remote", &h.config, URL, USER).unwrap();
    fs::remove_file(h.basedir().join("broken").join("key")).unwrap();

    let (local, remote) = h
        .config
        .get_diaries()
        .expect("listing should survive one damaged record");
    assert_eq!(local.len(), 2);
    assert_eq!(remote.len(), 1);
    assert_eq!(remote[0].name(), "remote");
    assert!(h.config.has_diary("broken").unwrap());
    assert!(get_diary("broken", &h.config).is_err());
}

#[test]
fn test_promote_then_demote_preserves_entries() {
    let h = Harness::new();
    let local = get_diary("roundtrip", &h.config).unwrap();
    for text in ["one", "two", "three"] {
        local.add_entry(text).unwrap();
    }

    h.config.promote_diary("roundtrip", URL, USER).unwrap();
    let back = h.config.demote_diary("roundtrip").unwrap();

    let texts: Vec<String> = back
        .get_entries()
        .unwrap()
        .into_iter()
        .map(|e| e.text)
        .collect();
    assert_eq!(texts, vec!["one", "two", "three"]);
    assert_eq!(h.server_diaries(), 0);
}

#[test]
fn test_has_remote_file() {
    let h = Harness::new();
    let remote = create_remote_diary("remote", &h.config, URL, USER).unwrap();
    let local = get_diary("diary2", &h.config).unwrap();

    assert!(h.config.has_remote_file(&remote, None).unwrap());
    assert!(h.config.has_remote_file(&remote, Some("key")).unwrap());
    assert!(!h.config.has_remote_file(&remote, Some("other")).unwrap());
    assert!(!h.config.has_remote_file("diary2", None).unwrap());
    assert!(!h.config.has_remote_file("nowhere", None).unwrap());

    assert!(matches!(
        h.config.has_remote_file(&local, Some("key")),
        Err(ConfigError::LocalHasNoRemoteFiles(_))
    ));
    assert!(matches!(
        h.config.has_remote_file(DiaryTarget::None, None),
        Err(ConfigError::MissingTarget)
    ));
    assert!(matches!(
        h.config.has_remote_file(&remote, Some("../config")),
        Err(ConfigError::Invalid(_))
    ));
}
