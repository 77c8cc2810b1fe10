use std::io::Write;
use std::rc::Rc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use message_mock::cli::{parse_send_line, Cli, Config};
use message_mock::client::{ClientError, ErrorHandler, EventHandler, MessagingClient};
use message_mock::logging;
use message_mock::protocol::{ClientEvent, OutgoingMessage};
use message_mock::simulation::MockClient;
use message_mock::tlog;

fn print_event(event: ClientEvent) {
    match serde_json::to_string(&event) {
        Ok(line) => {
            let mut stdout = std::io::stdout().lock();
            let _ = writeln!(stdout, "{line}");
            let _ = stdout.flush();
        }
        Err(err) => tlog!("failed to encode event: {err}"),
    }
}

async fn read_sends(client: &MockClient) -> Result<(), String> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.map_err(|err| err.to_string())? {
        if line.trim().is_empty() {
            continue;
        }
        let Some((handle, text)) = parse_send_line(&line) else {
            tlog!("ignored input {line:?}: expected `<handle> <text>`");
            continue;
        };
        if let Err(err) = client.send_message(OutgoingMessage::text(handle, text)) {
            tlog!("send to {} failed: {err}", logging::handle(handle));
        }
    }
    tlog!("stdin closed");
    // Keep the simulation running after input ends.
    std::future::pending::<()>().await;
    Ok(())
}

async fn sleep_for(duration: Option<std::time::Duration>) {
    match duration {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), String> {
    logging::init();
    let config = Config::from_cli_and_env(Cli::parse()).map_err(|err| err.to_string())?;
    let client = MockClient::new(config.client).map_err(|err| err.to_string())?;

    let on_event: Rc<dyn EventHandler> = Rc::new(print_event);
    let on_error: Rc<dyn ErrorHandler> = Rc::new(|err: ClientError| {
        tlog!("client error: {err}");
    });
    client.listen(on_event, on_error).map_err(|err| err.to_string())?;

    tokio::select! {
        _ = client.run() => {}
        result = read_sends(&client) => result?,
        result = tokio::signal::ctrl_c() => {
            result.map_err(|err| err.to_string())?;
            tlog!("interrupted, shutting down");
        }
        _ = sleep_for(config.duration) => {
            tlog!("duration elapsed, shutting down");
        }
    }
    Ok(())
}
