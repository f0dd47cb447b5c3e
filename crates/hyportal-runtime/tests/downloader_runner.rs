//! `DownloaderRunner` against a scripted downloader binary.
#![cfg(unix)]

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{HeadlessHost, write_script};
use hyportal_core::{
    AppEvent, AuthWindowHost, AuthWindowListener, AuthWindowOptions, ChannelEmitter, NoopEmitter,
    WindowError, WindowId,
};
use hyportal_runtime::{AuthWindowController, DownloaderConfig, DownloaderError, DownloaderRunner};
use mockall::mock;
use tempfile::TempDir;

mock! {
    pub Host {}

    impl AuthWindowHost for Host {
        fn open(
            &self,
            options: &AuthWindowOptions,
            listener: Arc<dyn AuthWindowListener>,
        ) -> Result<WindowId, WindowError>;
        fn navigate(&self, window: WindowId, url: &str);
        fn close(&self, window: WindowId);
    }
}

const VERIFY: &str = "https://oauth.accounts.hytale.com/oauth2/device/verify?user_code=QWER-TY12";

fn runner_with(temp: &TempDir, script: &str, host: Arc<dyn AuthWindowHost>) -> DownloaderRunner {
    let config = DownloaderConfig::in_dir(temp.path());
    write_script(&config.binary, &format!("#!/bin/sh\n{script}"));
    DownloaderRunner::new(config, AuthWindowController::new(host), Arc::new(NoopEmitter))
}

#[tokio::test]
async fn missing_binary_is_reported() {
    let temp = tempfile::tempdir().unwrap();
    let runner = DownloaderRunner::new(
        DownloaderConfig::in_dir(temp.path()),
        AuthWindowController::new(Arc::new(HeadlessHost)),
        Arc::new(NoopEmitter),
    );
    let err = runner.run(&["-print-version"]).await.unwrap_err();
    assert!(matches!(err, DownloaderError::BinaryMissing(_)));
    assert!(!runner.is_busy());
}

#[tokio::test]
async fn collects_output_and_failures() {
    let temp = tempfile::tempdir().unwrap();
    let runner = runner_with(
        &temp,
        "if [ \"$1\" = fail ]; then echo 'bad credentials' >&2; exit 4; fi\necho \"args: $*\"\n",
        Arc::new(HeadlessHost),
    );

    let output = runner.run(&["-print-version", "-skip-update-check"]).await.unwrap();
    assert_eq!(output.stdout, "args: -print-version -skip-update-check\n");

    let err = runner.run(&["fail"]).await.unwrap_err();
    match err {
        DownloaderError::Exited { code, stderr } => {
            assert_eq!(code, Some(4));
            assert_eq!(stderr.trim(), "bad credentials");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn concurrent_run_is_busy() {
    let temp = tempfile::tempdir().unwrap();
    let runner = Arc::new(runner_with(&temp, "sleep 1\necho done\n", Arc::new(HeadlessHost)));

    let first = tokio::spawn({
        let runner = Arc::clone(&runner);
        async move { runner.run(&[]).await }
    });
    while !runner.is_busy() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let err = runner.run(&[]).await.unwrap_err();
    assert_eq!(err.code(), "DOWNLOADER_BUSY");
    assert_eq!(first.await.unwrap().unwrap().stdout, "done\n");
    assert!(!runner.is_busy());
}

#[tokio::test]
async fn progress_and_auth_url_are_forwarded() {
    let temp = tempfile::tempdir().unwrap();
    let mut host = MockHost::new();
    host.expect_open()
        .withf(|options, _| options.url == VERIFY && options.modal)
        .times(1)
        .returning(|_, _| Ok(WindowId(9)));
    host.expect_close().times(1).return_const(());

    let config = DownloaderConfig::in_dir(temp.path());
    write_script(
        &config.binary,
        &format!(
            "#!/bin/sh\necho 'Please visit {VERIFY} to authorize'\nsleep 0.1\necho 'Visit {VERIFY} again'\nsleep 0.1\necho '[=====     ] 50.0% (1.0 MB/2.0 MB)'\n"
        ),
    );
    let (emitter, mut events) = ChannelEmitter::new();
    let runner = DownloaderRunner::new(
        config,
        AuthWindowController::new(Arc::new(host)),
        Arc::new(emitter),
    );

    let mut progress = Vec::new();
    runner
        .run_with_progress(&[], |p| progress.push(p))
        .await
        .unwrap();

    assert_eq!(progress.len(), 1);
    assert!((progress[0].percent - 50.0).abs() < f64::EPSILON);
    assert_eq!(progress[0].loaded, Some(1024 * 1024));
    assert_eq!(progress[0].total, Some(2 * 1024 * 1024));

    let urls: Vec<AppEvent> = std::iter::from_fn(|| events.try_recv().ok()).collect();
    assert_eq!(urls, vec![AppEvent::AuthUrl { url: VERIFY.into() }]);
}

#[tokio::test]
async fn closing_auth_window_kills_downloader() {
    let temp = tempfile::tempdir().unwrap();
    let listener: Arc<Mutex<Option<Arc<dyn AuthWindowListener>>>> = Arc::default();
    let mut host = MockHost::new();
    {
        let listener = Arc::clone(&listener);
        host.expect_open().times(1).returning(move |_, l| {
            *listener.lock().unwrap() = Some(l);
            Ok(WindowId(3))
        });
    }
    host.expect_close().return_const(());

    let runner = Arc::new(runner_with(
        &temp,
        &format!("echo 'visit {VERIFY}'\nexec sleep 30\n"),
        Arc::new(host),
    ));
    let run = tokio::spawn({
        let runner = Arc::clone(&runner);
        async move { runner.run(&[]).await }
    });

    let window = loop {
        if let Some(l) = listener.lock().unwrap().clone() {
            break l;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    };
    window.on_closed();

    let result = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(result, Err(DownloaderError::Cancelled)));
    assert!(!runner.is_busy());
}

#[tokio::test]
async fn cancel_without_run_reports_nothing_to_do() {
    let temp = tempfile::tempdir().unwrap();
    let runner = runner_with(&temp, "exit 0\n", Arc::new(HeadlessHost));
    assert!(!runner.cancel());
}

#[tokio::test]
async fn cancel_stops_active_run() {
    let temp = tempfile::tempdir().unwrap();
    let runner = Arc::new(runner_with(&temp, "exec sleep 30\n", Arc::new(HeadlessHost)));
    let run = tokio::spawn({
        let runner = Arc::clone(&runner);
        async move { runner.run(&[]).await }
    });
    while !runner.is_busy() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert!(runner.cancel());
    let result = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(result, Err(DownloaderError::Cancelled)));
}
