use pitwall_client::FlightBlobExtractor;
use pitwall_core::testutil::{MockFetcher, MockResponse};
use pitwall_core::{AppError, FantasyPipeline, Mode, OutputLayout, Table};

use crate::integration::common::{official_pipeline, read_table, season_2024};

const STATS_URL: &str = "https://stats.example/statistics";

/// A statistics page as the site streams it: framing fragments, a decoy that
/// mentions only one marker, then the season payload inside a component tree.
const STATS_PAGE: &str = r##"<!DOCTYPE html><html><head>
<script src="/_next/static/chunks/main.js" async=""></script>
</head><body><div id="__next"></div>
<script>(self.__next_f=self.__next_f||[]).push([0])</script>
<script>self.__next_f.push([1,"1:HL[\"/_next/static/css/app.css\",\"style\"]\n"])</script>
<script>self.__next_f.push([1,"6:[\"$\",\"div\",null,{\"children\":\"seasonResult loading\"}]\n"])</script>
<script>self.__next_f.push([1,"7:[\"$\",\"$L8\",null,{\"seasonResult\":{\"season\":2025,\"raceResults\":{\"10\":{\"drivers\":[{\"id\":4,\"abbreviation\":\"NOR\",\"type\":\"driver\",\"totalPoints\":32,\"nnTotalPoints\":30,\"price\":29.8,\"priceChange\":0.1,\"percentOwned\":38.2,\"x2PercentOwned\":9.5}],\"constructors\":[{\"id\":2,\"abbreviation\":\"MCL\",\"type\":\"constructor\",\"totalPoints\":55,\"nnTotalPoints\":55,\"price\":33.1,\"priceChange\":-0.1,\"percentOwned\":61.5,\"x2PercentOwned\":null}]},\"2\":{\"drivers\":[{\"id\":4,\"abbreviation\":\"NOR\",\"type\":\"driver\",\"totalPoints\":\"12\",\"price\":29.5}],\"constructors\":[]}}},\"label\":\"Caf\\u00e9 {stats}\"}]\n"])</script>
</body></html>"##;

fn pipeline(fetcher: MockFetcher) -> FantasyPipeline<MockFetcher, FlightBlobExtractor> {
    FantasyPipeline::new(fetcher, FlightBlobExtractor::new(), STATS_URL)
}

#[tokio::test]
async fn page_is_reshaped_into_four_long_tables() {
    let fetcher = MockFetcher::new().route("stats.example", MockResponse::body(STATS_PAGE));
    let dir = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(dir.path());

    let written = pipeline(fetcher.clone()).run(2024, &layout).await.unwrap();

    assert_eq!(written.len(), 4);
    assert_eq!(fetcher.calls(), vec![STATS_URL.to_string()]);

    // The payload names its own season.
    let points = std::fs::read_to_string(layout.table_path(2025, Table::FantasyDriverPoints)).unwrap();
    assert_eq!(
        points,
        "season,round,id,abbr,type,totalPoints,nnTotalPoints\n\
         2025,2,4,NOR,driver,12,\n\
         2025,10,4,NOR,driver,32,30\n"
    );

    let prices = read_table(&layout.table_path(2025, Table::FantasyConstructorPrices));
    assert_eq!(prices.len(), 1);
    assert_eq!(prices[0]["round"], "10");
    assert_eq!(prices[0]["priceChange"], "-0.1");
    assert_eq!(prices[0]["percentOwned"], "61.5");
    assert_eq!(prices[0]["x2PercentOwned"], "");

    let constructor_points = read_table(&layout.table_path(2025, Table::FantasyConstructorPoints));
    assert_eq!(constructor_points.len(), 1);
    assert_eq!(constructor_points[0]["abbr"], "MCL");
}

#[tokio::test]
async fn page_without_payload_is_an_extraction_error() {
    let page = r#"<html><body><script>self.__next_f.push([1,"0:[\"$\",\"html\",null,{}]\n"])</script></body></html>"#;
    let fetcher = MockFetcher::new().route("stats.example", MockResponse::body(page));
    let dir = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(dir.path());

    let err = pipeline(fetcher).run(2025, &layout).await.unwrap_err();

    assert!(matches!(err, AppError::ExtractionError(_)));
    assert!(!dir.path().join("seasons").exists());
}

#[tokio::test]
async fn page_fetch_failure_is_not_retried() {
    let fetcher = MockFetcher::new().route("stats.example", MockResponse::Status(503));
    let dir = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(dir.path());

    let err = pipeline(fetcher.clone()).run(2025, &layout).await.unwrap_err();

    assert!(matches!(err, AppError::HttpError(_)));
    assert_eq!(fetcher.calls().len(), 1);
}

#[tokio::test]
async fn fantasy_and_official_tables_share_a_season_directory() {
    let page = STATS_PAGE.replace("\\\"season\\\":2025", "\\\"season\\\":2024");
    let fetcher = season_2024(MockFetcher::new()).route("stats.example", MockResponse::body(page));
    let dir = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(dir.path());

    let mut written = official_pipeline(fetcher.clone(), 2)
        .run_season(2024, Mode::Both, true, &layout)
        .await
        .unwrap();
    written.extend(pipeline(fetcher).run(2024, &layout).await.unwrap());

    let mut files: Vec<_> = std::fs::read_dir(layout.season_dir(2024))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    files.sort();

    assert_eq!(written.len(), 9);
    assert_eq!(
        files,
        [
            "dim_round_dates.csv",
            "f1_official_constructor_race_points.csv",
            "f1_official_constructor_standings.csv",
            "f1_official_driver_race_points.csv",
            "f1_official_driver_standings.csv",
            "f1fantasytools_points_constructors_long.csv",
            "f1fantasytools_points_drivers_long.csv",
            "f1fantasytools_prices_constructors_long.csv",
            "f1fantasytools_prices_drivers_long.csv",
        ]
    );
}
