use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use zenith_client::{ClientEvent, ConnectionState, SessionClient, SubTaskVisual, ViewModel};
use zenith_core::{Config, Paths};

pub async fn run(intent: Option<String>) -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;

    let mut client = SessionClient::new(&config);
    client.connect();

    if !client.wait_until_connected(Duration::from_secs(10)).await {
        anyhow::bail!(
            "Could not reach the agent backend at {}. Is it running? Try `zenith doctor`.",
            config.backend.endpoint
        );
    }

    match intent {
        Some(intent) => {
            // Single-intent mode: stream one task to completion and exit.
            let outcome = submit_and_stream(&mut client, &intent).await;
            client.close();
            outcome
        }
        None => interactive(client).await,
    }
}

async fn submit_and_stream(client: &mut SessionClient, intent: &str) -> anyhow::Result<()> {
    if !client.submit(intent).await {
        anyhow::bail!("Submission dropped: backend not connected.");
    }
    println!("▶ {}", intent.trim());

    let mut printed = 0usize;
    loop {
        let Some(event) = client.next_event().await else {
            anyhow::bail!("Transport stopped.");
        };
        match event {
            ClientEvent::Connectivity(state) => print_connectivity(state),
            ClientEvent::Updated => {
                let view = client.view();
                print_new_thoughts(&view, &mut printed);
                if let Some(error) = &view.error {
                    println!();
                    println!("✗ Agent error: {}", error);
                    break;
                }
                if view.result.is_some() {
                    print_task_end(&view);
                    break;
                }
            }
        }
    }
    Ok(())
}

async fn interactive(mut client: SessionClient) -> anyhow::Result<()> {
    println!("zenith interactive mode (Ctrl+C to exit)");
    println!("Type an intent and press Enter.");
    println!("Commands: /tasks show plan | /log replay thoughts | /cancel | /quit");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut printed = 0usize;
    let mut task_open = false;
    print_prompt();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "" => {}
                    "/quit" | "/exit" => break,
                    "/tasks" => print_subtasks(&client.view()),
                    "/log" => {
                        let mut from_start = 0usize;
                        print_new_thoughts(&client.view(), &mut from_start);
                    }
                    "/cancel" => {
                        if client.cancel().await {
                            println!("Cancel requested.");
                        } else {
                            println!("Not connected.");
                        }
                    }
                    input => {
                        if client.submit(input).await {
                            printed = 0;
                            task_open = true;
                        } else {
                            println!("Dropped: backend not connected.");
                        }
                    }
                }
                print_prompt();
            }
            event = client.next_event() => {
                let Some(event) = event else { break };
                match event {
                    ClientEvent::Connectivity(state) => print_connectivity(state),
                    ClientEvent::Updated => {
                        let view = client.view();
                        print_new_thoughts(&view, &mut printed);
                        if task_open {
                            if let Some(error) = &view.error {
                                println!("✗ Agent error: {}", error);
                                task_open = false;
                                print_prompt();
                            } else if view.result.is_some() {
                                print_task_end(&view);
                                task_open = false;
                                print_prompt();
                            }
                        }
                    }
                }
            }
        }
    }

    client.close();
    Ok(())
}

fn print_task_end(view: &ViewModel) {
    print_subtasks(view);
    println!();
    println!("Result:");
    if let Some(result) = &view.result {
        println!("{}", result);
    }
    println!();
}

fn print_subtasks(view: &ViewModel) {
    if view.subtasks.is_empty() {
        println!("No plan yet.");
        return;
    }
    println!("Plan:");
    for task in &view.subtasks {
        println!("  {} {}", visual_dot(task.visual), task.description);
    }
}

fn print_new_thoughts(view: &ViewModel, printed: &mut usize) {
    for line in &view.thoughts[*printed..] {
        if line.thought.is_empty() {
            println!("· {}", line.label);
        } else {
            println!("· {}: {}", line.label, line.thought);
        }
    }
    *printed = view.thoughts.len();
}

fn visual_dot(visual: SubTaskVisual) -> &'static str {
    match visual {
        SubTaskVisual::Dim => "○",
        SubTaskVisual::Pulsing => "◐",
        SubTaskVisual::Struck => "✓",
        SubTaskVisual::Alert => "✗",
    }
}

fn print_connectivity(state: ConnectionState) {
    match state {
        ConnectionState::Connecting => println!("· Connecting to agent backend"),
        ConnectionState::Connected => println!("✓ Connected to agent backend"),
        ConnectionState::Disconnected => println!("✗ Connection lost, retrying"),
    }
}

fn print_prompt() {
    print!("zenith> ");
    let _ = std::io::stdout().flush();
}
