//! Bundled datasets served when no backend is configured (`API_URL` empty or
//! `USE_MOCK_DATA=true`). Event start times are relative to the moment of the
//! call so the time-range filters always have something to show.

use chrono::{DateTime, Duration, Utc};

use crate::types::{
    BothTeamsScoreOdds, Direction, Event, EventStats, EventStatus, League, MatchOdds, OddsData,
    OddsMovement, OverUnderOdds, Prediction, PredictionKind, Score, Severity, SmartMoneyMovement,
    Sport, StatPair, Team,
};

pub fn events() -> Vec<Event> {
    events_at(Utc::now())
}

pub fn events_at(now: DateTime<Utc>) -> Vec<Event> {
    let super_lig = league("tr-super", "Süper Lig", "Türkiye");
    let premier = league("eng-premier", "Premier League", "İngiltere");

    vec![
        Event {
            predictions: vec![
                prediction("p1", PredictionKind::Win, "Ev Sahibi", 85, 2.10),
                prediction("p2", PredictionKind::Over, "2.5 Üst", 78, 1.85),
                prediction("p3", PredictionKind::BothTeamsScore, "KG Var", 92, 1.65),
            ],
            odds: Some(OddsData {
                match_odds: Some(match_odds(2.10, Some(3.40), 3.20)),
                over_under: Some(over_under(1.85, 2.05, 2.5)),
                both_teams_score: Some(BothTeamsScoreOdds { yes: 1.65, no: 2.20 }),
                double_chance: None,
            }),
            ..scheduled(
                "1",
                "Futbol",
                super_lig.clone(),
                team("gal", "Galatasaray"),
                team("fb", "Fenerbahçe"),
                now + Duration::hours(2),
            )
        },
        Event {
            predictions: vec![
                prediction("p4", PredictionKind::Draw, "Beraberlik", 72, 3.20),
                prediction("p5", PredictionKind::Under, "2.5 Alt", 68, 2.05),
            ],
            odds: Some(OddsData {
                match_odds: Some(match_odds(2.40, Some(3.20), 2.90)),
                over_under: Some(over_under(1.95, 1.85, 2.5)),
                ..Default::default()
            }),
            ..scheduled(
                "2",
                "Futbol",
                super_lig.clone(),
                team("bjk", "Beşiktaş"),
                team("ts", "Trabzonspor"),
                now + Duration::hours(4),
            )
        },
        Event {
            status: EventStatus::Live,
            minute: Some(32),
            score: Some(Score { home: 1, away: 1 }),
            predictions: vec![prediction("p6", PredictionKind::Win, "Deplasman", 65, 2.85)],
            odds: Some(OddsData {
                match_odds: Some(match_odds(2.60, Some(3.40), 2.85)),
                ..Default::default()
            }),
            stats: Some(stats([(48.0, 52.0), (8.0, 11.0), (3.0, 5.0), (3.0, 5.0), (7.0, 9.0), (1.0, 2.0), (0.0, 0.0)])),
            ..scheduled(
                "3",
                "Futbol",
                league("es-laliga", "La Liga", "İspanya"),
                team("rm", "Real Madrid"),
                team("fcb", "Barcelona"),
                now - Duration::minutes(30),
            )
        },
        Event {
            predictions: vec![
                prediction("p7", PredictionKind::Over, "165.5 Üst", 88, 1.90),
                prediction("p8", PredictionKind::Win, "Ev Sahibi -3.5", 75, 1.95),
                prediction("p9", PredictionKind::Custom, "İlk Yarı Ev Sahibi", 82, 2.20),
                prediction("p10", PredictionKind::Custom, "Toplam Üçlük 25.5 Üst", 79, 1.85),
            ],
            odds: Some(OddsData {
                match_odds: Some(match_odds(1.45, Some(18.0), 2.75)),
                over_under: Some(over_under(1.90, 1.90, 165.5)),
                ..Default::default()
            }),
            ..scheduled(
                "4",
                "Basketbol",
                league("euroleague", "EuroLeague", "Avrupa"),
                team("efes", "Anadolu Efes"),
                team("fener", "Fenerbahçe Beko"),
                now + Duration::hours(24),
            )
        },
        Event {
            predictions: vec![
                prediction("p13", PredictionKind::Win, "Djokovic", 78, 1.75),
                prediction("p14", PredictionKind::Custom, "Toplam Set 3.5 Üst", 82, 1.90),
            ],
            odds: Some(OddsData {
                match_odds: Some(match_odds(1.75, None, 2.10)),
                ..Default::default()
            }),
            ..scheduled(
                "5",
                "Tenis",
                league("wimbledon", "Wimbledon", "İngiltere"),
                team("djokovic", "N. Djokovic"),
                team("alcaraz", "C. Alcaraz"),
                now + Duration::hours(3),
            )
        },
        Event {
            predictions: vec![prediction("p11", PredictionKind::Under, "2.5 Alt", 91, 1.70)],
            odds: Some(OddsData {
                match_odds: Some(match_odds(2.75, Some(3.10), 2.60)),
                over_under: Some(over_under(2.10, 1.70, 2.5)),
                both_teams_score: Some(BothTeamsScoreOdds { yes: 1.95, no: 1.85 }),
                double_chance: None,
            }),
            ..scheduled(
                "6",
                "Futbol",
                super_lig,
                team("ank", "Ankaragücü"),
                team("kon", "Konyaspor"),
                now + Duration::hours(5),
            )
        },
        Event {
            status: EventStatus::Live,
            minute: Some(67),
            score: Some(Score { home: 2, away: 2 }),
            predictions: vec![prediction("p12", PredictionKind::Over, "3.5 Üst", 85, 2.20)],
            odds: Some(OddsData {
                match_odds: Some(match_odds(1.95, Some(3.80), 4.20)),
                over_under: Some(over_under(2.20, 1.65, 3.5)),
                ..Default::default()
            }),
            stats: Some(stats([(58.0, 42.0), (15.0, 12.0), (6.0, 5.0), (7.0, 4.0), (9.0, 11.0), (2.0, 3.0), (0.0, 0.0)])),
            ..scheduled(
                "7",
                "Futbol",
                premier,
                team("mci", "Manchester City"),
                team("ars", "Arsenal"),
                now - Duration::minutes(60),
            )
        },
    ]
    .into_iter()
    .map(Event::normalized)
    .collect()
}

/// Odds movements for the mock events, several per event.
pub fn odds_movements() -> Vec<OddsMovement> {
    odds_movements_at(Utc::now())
}

pub fn odds_movements_at(now: DateTime<Utc>) -> Vec<OddsMovement> {
    let ts = |mins_ago: i64| (now - Duration::minutes(mins_ago)).to_rfc3339();
    let kickoff = |hours: i64| (now + Duration::hours(hours)).to_rfc3339();

    vec![
        movement(
            ("gal-fb", "Galatasaray vs Fenerbahçe", "Süper Lig", "Türkiye"),
            ("Maç Sonucu", "1"),
            (2.85, 2.35),
            Direction::Steaming,
            ts(25),
            kickoff(2),
            None,
        ),
        movement(
            ("gal-fb", "Galatasaray vs Fenerbahçe", "Süper Lig", "Türkiye"),
            ("Maç Sonucu", "2"),
            (2.70, 3.20),
            Direction::Drifting,
            ts(40),
            kickoff(2),
            None,
        ),
        movement(
            ("bjk-ts", "Beşiktaş vs Trabzonspor", "Süper Lig", "Türkiye"),
            ("Handikap", "Beşiktaş -1"),
            (3.20, 2.65),
            Direction::Shortening,
            ts(55),
            kickoff(4),
            None,
        ),
        movement(
            ("rm-bar", "Real Madrid vs Barcelona", "La Liga", "İspanya"),
            ("Çifte Şans", "X2"),
            (1.45, 1.85),
            Direction::Drifting,
            ts(10),
            (now - Duration::minutes(30)).to_rfc3339(),
            Some((1, 1, 32)),
        ),
        movement(
            ("rm-bar", "Real Madrid vs Barcelona", "La Liga", "İspanya"),
            ("Maç Sonucu", "1"),
            (2.40, 2.60),
            Direction::Drifting,
            ts(5),
            (now - Duration::minutes(30)).to_rfc3339(),
            Some((1, 1, 32)),
        ),
        movement(
            ("ank-kon", "Ankaragücü vs Konyaspor", "Süper Lig", "Türkiye"),
            ("Toplam Gol", "Alt 2.5"),
            (1.80, 1.70),
            Direction::Steaming,
            ts(90),
            kickoff(5),
            None,
        ),
        movement(
            ("mci-ars", "Manchester City vs Arsenal", "Premier League", "İngiltere"),
            ("Toplam Gol", "Üst 3.5"),
            (1.75, 2.20),
            Direction::Drifting,
            ts(3),
            (now - Duration::minutes(60)).to_rfc3339(),
            Some((2, 2, 67)),
        ),
    ]
}

/// Smart-money alerts, used when no backend is configured.
pub fn smart_money_movements() -> Vec<SmartMoneyMovement> {
    vec![
        smart_money(
            1,
            ("Galatasaray", "Fenerbahçe", "Süper Lig"),
            ("Maç Sonucu", "1"),
            (2.85, 2.35, -17.5, 1.21),
            45,
            "2025-01-07T10:30:00Z",
            false,
            Severity::High,
            "Galatasaray kazanma oranında büyük düşüş - profesyonel bahis akışı tespit edildi",
        ),
        smart_money(
            2,
            ("Manchester City", "Arsenal", "Premier League"),
            ("Toplam Gol", "Üst 2.5"),
            (1.75, 2.10, 20.0, 1.20),
            120,
            "2025-01-07T09:45:00Z",
            false,
            Severity::Medium,
            "Toplam gol oranında ani yükseliş - değer fırsatı olabilir",
        ),
        smart_money(
            3,
            ("Barcelona", "Real Madrid", "La Liga"),
            ("Çifte Şans", "1X"),
            (1.45, 1.85, 27.6, 1.28),
            35,
            "2025-01-07T11:15:00Z",
            true,
            Severity::Critical,
            "Canlı maçta çifte şans oranında keskin artış",
        ),
        smart_money(
            4,
            ("Beşiktaş", "Trabzonspor", "Süper Lig"),
            ("Handikap", "Beşiktaş -1"),
            (3.20, 2.65, -17.2, 1.21),
            75,
            "2025-01-07T10:00:00Z",
            false,
            Severity::High,
            "Handikap oranında büyük hareket - güçlü bahis akışı",
        ),
        smart_money(
            5,
            ("Liverpool", "Chelsea", "Premier League"),
            ("Maç Sonucu", "X"),
            (3.85, 4.50, 16.9, 1.17),
            180,
            "2025-01-07T09:20:00Z",
            false,
            Severity::Low,
            "Beraberlik oranında yükseliş trendi",
        ),
        smart_money(
            6,
            ("Bayern Munich", "Borussia Dortmund", "Bundesliga"),
            ("Korner", "Üst 10.5"),
            (1.90, 2.35, 23.7, 1.24),
            95,
            "2025-01-07T09:30:00Z",
            false,
            Severity::Medium,
            "Korner sayısı oranında büyük artış - profesyonel değerlendirme",
        ),
    ]
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

fn scheduled(
    id: &str,
    sport: &str,
    league: League,
    home_team: Team,
    away_team: Team,
    start_time: DateTime<Utc>,
) -> Event {
    Event {
        id: id.to_string(),
        sport: Sport::from_label(sport),
        league,
        home_team,
        away_team,
        start_time,
        status: EventStatus::Scheduled,
        is_live: false,
        minute: None,
        score: None,
        odds: None,
        stats: None,
        predictions: Vec::new(),
        has_ai_predictions: false,
        betting_volume_percentage: None,
    }
}

fn league(id: &str, name: &str, country: &str) -> League {
    League { id: id.to_string(), name: name.to_string(), country: Some(country.to_string()) }
}

fn team(id: &str, name: &str) -> Team {
    Team { id: id.to_string(), name: name.to_string(), logo: None }
}

fn prediction(id: &str, kind: PredictionKind, value: &str, confidence: u8, odds: f64) -> Prediction {
    Prediction { id: id.to_string(), kind, value: value.to_string(), confidence, odds: Some(odds) }
}

fn match_odds(home: f64, draw: Option<f64>, away: f64) -> MatchOdds {
    MatchOdds { home, draw, away }
}

fn over_under(over: f64, under: f64, line: f64) -> OverUnderOdds {
    OverUnderOdds { over, under, line: Some(line) }
}

/// possession, shots, shots on target, corners, fouls, yellow, red.
fn stats(pairs: [(f64, f64); 7]) -> EventStats {
    let [possession, shots, on_target, corners, fouls, yellow, red] =
        pairs.map(|(home, away)| Some(StatPair { home, away }));
    EventStats {
        possession,
        shots,
        shots_on_target: on_target,
        corners,
        fouls,
        yellow_cards: yellow,
        red_cards: red,
    }
}

fn movement(
    (slug, label, league, country): (&str, &str, &str, &str),
    (market, outcome): (&str, &str),
    (opening_odds, current_odds): (f64, f64),
    direction: Direction,
    last_updated: String,
    event_time: String,
    live: Option<(u32, u32, u32)>,
) -> OddsMovement {
    let change = ((current_odds - opening_odds) / opening_odds * 1000.0).round() / 10.0;
    OddsMovement {
        event_slug: slug.to_string(),
        match_label: label.to_string(),
        sport: "Futbol".to_string(),
        sport_code: "football".to_string(),
        league: league.to_string(),
        league_country: country.to_string(),
        market: market.to_string(),
        market_description: String::new(),
        outcome: outcome.to_string(),
        opening_odds,
        current_odds,
        change_percentage: change,
        multiplier: ((current_odds / opening_odds) * 100.0).round() / 100.0,
        direction,
        last_updated,
        event_time,
        event_status: if live.is_some() { "live" } else { "scheduled" }.to_string(),
        is_live: live.is_some(),
        home_score: live.map(|(h, _, _)| h),
        away_score: live.map(|(_, a, _)| a),
        minute_of_match: live.map(|(_, _, m)| m),
        betting_volume_percent: None,
        home_team_country: country.to_string(),
        away_team_country: country.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
fn smart_money(
    id: i64,
    (home, away, league): (&str, &str, &str),
    (market_name, outcome): (&str, &str),
    (previous_odds, current_odds, change_percent, multiplier): (f64, f64, f64, f64),
    minutes_to_kickoff: i64,
    recorded_at: &str,
    is_live: bool,
    severity: Severity,
    alert_message: &str,
) -> SmartMoneyMovement {
    SmartMoneyMovement {
        id,
        event_external_id: (12344 + id).to_string(),
        home_team: home.to_string(),
        away_team: away.to_string(),
        match_label: Some(format!("{home} vs {away}")),
        market_name: market_name.to_string(),
        outcome: outcome.to_string(),
        previous_odds,
        current_odds,
        change_percent,
        multiplier,
        minutes_to_kickoff,
        recorded_at: recorded_at.to_string(),
        is_live,
        alert_message: alert_message.to_string(),
        severity: Some(severity),
        league: Some(league.to_string()),
        sport: Some("Futbol".to_string()),
    }
}
