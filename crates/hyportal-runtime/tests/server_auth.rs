//! Device authorization driven by server output.
#![cfg(unix)]

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use common::{ServerFixture, wait_for_file};
use hyportal_core::{
    AppEvent, AuthWindowHost, AuthWindowListener, AuthWindowOptions, WindowError, WindowId,
};
use mockall::mock;
use mockall::predicate::eq;

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

const NO_TOKENS: &str = "No server tokens configured. Use /auth login to authenticate.";
const SUCCESS: &str = "Authentication successful! Use '/auth status' to view details.";

fn device_flow_script() -> String {
    format!(
        r#"echo "[WARN] {NO_TOKENS}"
read line; echo "$line" >> stdin.log
echo "Enter code: ABCD-1234"
echo "Visit https://oauth.accounts.hytale.com/oauth2/device/verify?flow=device"
sleep 0.2
echo "{SUCCESS}"
read line; echo "$line" >> stdin.log
exec sleep 30
"#
    )
}

fn auto_inputs(events: &mut tokio::sync::mpsc::UnboundedReceiver<AppEvent>) -> Vec<String> {
    let mut inputs = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let AppEvent::ServerAutoInput { data, .. } = event {
            inputs.push(data);
        }
    }
    inputs
}

#[tokio::test]
async fn device_flow_sends_login_then_persistence() {
    let mut host = MockHost::new();
    host.expect_open()
        .withf(|options, _| {
            options.url
                == "https://oauth.accounts.hytale.com/oauth2/device/verify?flow=device&user_code=ABCD-1234"
                && !options.modal
        })
        .times(1)
        .returning(|_, _| Ok(WindowId(1)));
    host.expect_close().with(eq(WindowId(1))).times(1).return_const(());
    host.expect_navigate().never();

    let mut fx = ServerFixture::with_host(&device_flow_script(), Arc::new(host));
    fx.supervisor.start(fx.request("alpha")).await.unwrap();

    let stdin_log = fx.server_dir.join("stdin.log");
    let written = wait_for_file(&stdin_log, |log| log.lines().count() == 2).await;
    assert_eq!(written, "/auth login device\n/auth persistence Encrypted\n");

    // Let the pump publish the second echo.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        auto_inputs(&mut fx.events),
        vec!["/auth login device\n", "/auth persistence Encrypted\n"]
    );

    fx.supervisor.stop("alpha").await.unwrap();
}

#[tokio::test]
async fn stopping_mid_flow_closes_the_auth_window() {
    let opened = Arc::new(AtomicBool::new(false));
    let closed = Arc::new(AtomicBool::new(false));
    let mut host = MockHost::new();
    let on_open = Arc::clone(&opened);
    host.expect_open().times(1).returning(move |_, _| {
        on_open.store(true, Ordering::SeqCst);
        Ok(WindowId(7))
    });
    let on_close = Arc::clone(&closed);
    host.expect_close()
        .with(eq(WindowId(7)))
        .times(1)
        .returning(move |_| on_close.store(true, Ordering::SeqCst));
    host.expect_navigate().never();

    let script = format!(
        r#"echo "[WARN] {NO_TOKENS}"
read line
echo "Enter code: WXYZ-9876"
echo "Visit https://oauth.accounts.hytale.com/oauth2/device/verify?flow=device"
exec sleep 30
"#
    );
    let fx = ServerFixture::with_host(&script, Arc::new(host));
    fx.supervisor.start(fx.request("alpha")).await.unwrap();

    for _ in 0..200 {
        if opened.load(Ordering::SeqCst) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    assert!(opened.load(Ordering::SeqCst));
    assert!(!closed.load(Ordering::SeqCst));

    fx.supervisor.stop("alpha").await.unwrap();
    assert!(closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn existing_auth_file_suppresses_login() {
    let mut host = MockHost::new();
    host.expect_open().never();

    let script = format!("echo '{NO_TOKENS}'\nexec cat > stdin.log\n");
    let mut fx = ServerFixture::with_host(&script, Arc::new(host));
    std::fs::create_dir_all(fx.server_dir.join("auth")).unwrap();
    std::fs::write(fx.server_dir.join("auth/auth.enc"), b"\x01encrypted").unwrap();

    fx.supervisor.start(fx.request("alpha")).await.unwrap();
    wait_for_file(&fx.server_dir.join("stdin.log"), |_| true).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(auto_inputs(&mut fx.events).is_empty());
    fx.supervisor.stop("alpha").await.unwrap();
    let written = std::fs::read_to_string(fx.server_dir.join("stdin.log")).unwrap();
    assert!(written.is_empty());
}

#[tokio::test]
async fn empty_auth_file_is_removed_before_launch() {
    let mut fx = ServerFixture::new("exec sleep 30\n");
    let stale = fx.server_dir.join("auth.enc");
    std::fs::write(&stale, "  \n").unwrap();

    fx.supervisor.start(fx.request("alpha")).await.unwrap();
    assert!(!stale.exists());
    fx.supervisor.stop("alpha").await.unwrap();
    fx.next_status().await;
}
