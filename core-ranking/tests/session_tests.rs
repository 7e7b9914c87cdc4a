use core_library::{AlbumFilter, LibraryError, NewSong, PreviewState, SongRecord};
use core_ranking::{MatchPair, RankingError, RankingSession};
use core_runtime::RankingConfig;
use std::collections::VecDeque;

fn record(album: &str, score: f64, matches: u32) -> SongRecord {
    let mut record = SongRecord::new("Genesis", album, "1980", score);
    record.matches = matches;
    record
}

fn session_with(songs: Vec<(&str, SongRecord)>) -> RankingSession {
    let mut session = RankingSession::with_seed(RankingConfig::default(), 2024);
    session.merge(songs.into_iter().map(|(t, r)| (t.to_string(), r)));
    session
}

fn large_session(n: usize) -> RankingSession {
    let songs = (0..n)
        .map(|i| (format!("Track {i}"), record("Album", 1200.0, 0)))
        .collect::<Vec<_>>();
    let mut session = RankingSession::with_seed(RankingConfig::default(), 99);
    session.merge(songs);
    session
}

#[test]
fn test_merge_keeps_keys_unique_and_existing_records() {
    let mut session = session_with(vec![("Mama", record("Genesis", 1300.0, 4))]);
    let added = session.merge(vec![
        ("Mama".to_string(), record("Other", 900.0, 0)),
        ("Abacab".to_string(), record("Abacab", 1200.0, 0)),
    ]);

    assert_eq!(added, 1);
    assert_eq!(session.len(), 2);
    assert_eq!(session.get("Mama").unwrap().score, 1300.0);
    assert!(session.has_unsaved_changes());
}

#[test]
fn test_matchup_is_none_only_below_two_candidates() {
    let mut session = session_with(vec![]);
    assert!(session.get_matchup().is_none());

    session.merge(vec![("Mama".to_string(), record("Genesis", 1200.0, 0))]);
    assert!(session.get_matchup().is_none());

    session.merge(vec![("Abacab".to_string(), record("Abacab", 1200.0, 0))]);
    let (a, b) = session.get_matchup().unwrap();
    assert_ne!(a, b);

    session.set_filter(AlbumFilter::from_label("Abacab"));
    assert!(session.get_matchup().is_none());
}

#[test]
fn test_save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("genesis.json");

    let mut mama = record("Genesis (1983)", 1216.0, 1).with_cover_url(Some("http://c/1".into()));
    mama.preview_url = PreviewState::Found("https://p/mama.m4a".into());
    let mut session = session_with(vec![
        ("Mama", mama),
        ("Duchess", record("Duke (1980)", 1184.0, 1)),
    ]);
    session.set_preview("Duchess", PreviewState::NotFound);

    let written = session.save(Some(&path)).unwrap();
    assert_eq!(written, path);
    assert!(!session.has_unsaved_changes());

    let mut reloaded = RankingSession::new(RankingConfig::default());
    assert_eq!(reloaded.load(&path).unwrap(), 2);
    assert_eq!(reloaded.store(), session.store());
    assert_eq!(reloaded.path(), Some(path.as_path()));

    // Saving again without a path goes to the remembered file.
    reloaded.update_score("Mama", "Duchess").unwrap();
    reloaded.save(None).unwrap();
    assert!(!reloaded.has_unsaved_changes());
}

#[test]
fn test_failed_load_leaves_state_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ not json").unwrap();

    let mut session = session_with(vec![
        ("Mama", record("Genesis", 1200.0, 0)),
        ("Abacab", record("Abacab", 1200.0, 0)),
    ]);
    session.get_matchup();

    assert!(matches!(
        session.load(&broken),
        Err(RankingError::Library(LibraryError::Format { .. }))
    ));
    assert!(matches!(
        session.load(&dir.path().join("missing.json")),
        Err(RankingError::Library(LibraryError::Io { .. }))
    ));
    assert_eq!(session.len(), 2);
    assert!(session.has_unsaved_changes());
    assert_eq!(session.history().len(), 1);
}

#[test]
fn test_load_clears_history_and_dirty_flag() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.json");
    let mut session = session_with(vec![
        ("Mama", record("Genesis", 1200.0, 0)),
        ("Abacab", record("Abacab", 1200.0, 0)),
    ]);
    session.save(Some(&path)).unwrap();
    session.get_matchup();
    session.update_score("Mama", "Abacab").unwrap();

    session.load(&path).unwrap();
    assert!(session.history().is_empty());
    assert!(!session.has_unsaved_changes());
    assert_eq!(session.get("Mama").unwrap().score, 1200.0);
}

#[test]
fn test_equal_ratings_move_by_half_k() {
    let mut session = session_with(vec![
        ("Mama", record("Genesis", 1200.0, 0)),
        ("Abacab", record("Abacab", 1200.0, 0)),
    ]);
    let k = session.config().k_factor;

    let change = session.update_score("Mama", "Abacab").unwrap();
    assert_eq!(change.winner_after - change.winner_before, k / 2.0);
    assert_eq!(change.loser_before - change.loser_after, k / 2.0);
}

#[test]
fn test_update_increments_matches_by_one_each() {
    let mut session = session_with(vec![
        ("Mama", record("Genesis", 1250.0, 3)),
        ("Abacab", record("Abacab", 1100.0, 7)),
    ]);
    let before: u32 = session.store().iter().map(|(_, r)| r.matches).sum();

    session.update_score("Abacab", "Mama").unwrap();

    assert_eq!(session.get("Mama").unwrap().matches, 4);
    assert_eq!(session.get("Abacab").unwrap().matches, 8);
    let after: u32 = session.store().iter().map(|(_, r)| r.matches).sum();
    assert_eq!(after, before + 2);
}

#[test]
fn test_update_on_missing_song_fails_without_side_effects() {
    let mut session = session_with(vec![("Mama", record("Genesis", 1200.0, 0))]);
    let dirty_before = session.has_unsaved_changes();

    assert!(matches!(
        session.update_score("Mama", "Ghost"),
        Err(RankingError::SongNotFound(_))
    ));
    assert_eq!(session.get("Mama").unwrap().matches, 0);
    assert_eq!(session.has_unsaved_changes(), dirty_before);
}

#[test]
fn test_no_pair_repeats_within_history_window() {
    let mut session = large_session(60);
    let window = session.config().history_capacity;
    let mut recent: VecDeque<MatchPair> = VecDeque::new();

    for round in 0..300 {
        let (a, b) = session.get_matchup().unwrap();
        let pair = MatchPair::new(&a, &b);
        assert!(
            !recent.contains(&pair),
            "round {round}: {a} vs {b} repeated within {window} games"
        );

        recent.push_back(pair);
        if recent.len() > window {
            recent.pop_front();
        }
        session.update_score(&a, &b).unwrap();
    }
}

#[test]
fn test_seeded_sessions_replay_identically() {
    let mut first = large_session(30);
    let mut second = large_session(30);
    for _ in 0..25 {
        assert_eq!(first.get_matchup(), second.get_matchup());
    }
}

#[test]
fn test_two_song_scenario() {
    let mut session = RankingSession::with_seed(RankingConfig::default(), 5);
    session.add_song(NewSong::new("Mama")).unwrap();
    session.add_song(NewSong::new("Abacab")).unwrap();

    let (a, b) = session.get_matchup().unwrap();
    session.update_score(&a, &b).unwrap();

    let winner = session.get(&a).unwrap();
    let loser = session.get(&b).unwrap();
    assert!((winner.score - 1216.0).abs() < 1e-9);
    assert!((loser.score - 1184.0).abs() < 1e-9);
    assert_eq!(winner.matches, 1);
    assert_eq!(loser.matches, 1);

    let board = session.leaderboard();
    assert_eq!(board[0].title, a);
    assert_eq!(board[1].title, b);
}

#[test]
fn test_album_delete_resets_filter() {
    let mut session = session_with(vec![
        ("Duchess", record("Duke (1980)", 1200.0, 0)),
        ("Mama", record("Genesis (1983)", 1200.0, 0)),
        ("Turn It On Again", record("Duke (1980)", 1200.0, 0)),
    ]);
    session.set_filter(AlbumFilter::from_label("Duke (1980)"));
    assert_eq!(session.active_keys().len(), 2);

    assert_eq!(session.delete_album("Duke (1980)").unwrap(), 2);
    assert_eq!(session.filter(), &AlbumFilter::All);
    assert_eq!(session.active_keys(), vec!["Mama".to_string()]);
    assert_eq!(session.albums(), vec!["Genesis (1983)".to_string()]);
}

#[test]
fn test_merge_selected_averages_and_sums() {
    let mut session = session_with(vec![
        ("Mama", record("Genesis (1983)", 1000.0, 5)),
        ("Mama (2007 Remaster)", record("Turn It On Again", 1400.0, 3)),
    ]);

    let outcome = session
        .merge_songs(&["Mama", "Mama (2007 Remaster)"], "Mama")
        .unwrap();

    assert_eq!(outcome.score, 1200.0);
    assert_eq!(outcome.matches, 8);
    assert_eq!(session.len(), 1);
    let merged = session.get("Mama").unwrap();
    assert_eq!(merged.score, 1200.0);
    assert_eq!(merged.matches, 8);
    assert_eq!(merged.album, "Genesis (1983)");
    assert_eq!(merged.preview_url, PreviewState::Unknown);
}

#[test]
fn test_export_writes_filtered_leaderboard() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.csv");
    let mut session = session_with(vec![
        ("Duchess", record("Duke (1980)", 1190.5, 0)),
        ("Mama", record("Genesis (1983)", 1300.0, 0)),
        ("Turn It On Again", record("Duke (1980)", 1250.9, 0)),
    ]);
    session.set_filter(AlbumFilter::from_label("Duke (1980)"));

    assert_eq!(session.export_csv(&path).unwrap(), 2);
    let csv = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = csv.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert_eq!(
        lines,
        vec![
            "Title,Artist,Album,Year,Rank,Score",
            "Turn It On Again,Genesis,Duke (1980),1980,1,1250",
            "Duchess,Genesis,Duke (1980),1980,2,1190",
        ]
    );

    session.set_filter(AlbumFilter::from_label("Nothing"));
    assert!(session.export_csv(&dir.path().join("empty.csv")).is_err());
}
