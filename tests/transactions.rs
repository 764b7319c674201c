mod common;

use common::{TestEnv, bulk, error, integer, simple};
use tidekv::commands::TransactionState;

const CLIENT: &str = "127.0.0.1:60001";

#[tokio::test]
async fn test_multi_exec_reply_sequence() {
    let env = TestEnv::new();
    let mut transaction = TransactionState::new();

    // The exact reply sequence for MULTI, SET, INCR, INCR, EXEC.
    assert_eq!(
        env.run_in(&mut transaction, CLIENT, &["MULTI"]).await,
        "+OK\r\n"
    );
    assert_eq!(
        env.run_in(&mut transaction, CLIENT, &["SET", "x", "1"]).await,
        "+QUEUED\r\n"
    );
    assert_eq!(
        env.run_in(&mut transaction, CLIENT, &["INCR", "x"]).await,
        "+QUEUED\r\n"
    );
    assert_eq!(
        env.run_in(&mut transaction, CLIENT, &["INCR", "x"]).await,
        "+QUEUED\r\n"
    );
    assert_eq!(
        env.run_in(&mut transaction, CLIENT, &["EXEC"]).await,
        "*3\r\n+OK\r\n:2\r\n:3\r\n"
    );
}

#[tokio::test]
async fn test_queued_commands_do_not_run_until_exec() {
    let env = TestEnv::new();
    let mut transaction = TransactionState::new();

    env.run_in(&mut transaction, CLIENT, &["MULTI"]).await;
    env.run_in(&mut transaction, CLIENT, &["SET", "x", "queued"]).await;

    // Another connection sees no effect yet.
    assert_eq!(env.run("127.0.0.1:60002", &["GET", "x"]).await, "$-1\r\n");

    env.run_in(&mut transaction, CLIENT, &["EXEC"]).await;

    assert_eq!(
        env.run("127.0.0.1:60002", &["GET", "x"]).await,
        bulk("queued")
    );
}

#[tokio::test]
async fn test_transaction_state_is_per_connection() {
    let env = TestEnv::new();
    let mut first = TransactionState::new();
    let mut second = TransactionState::new();

    assert_eq!(
        env.run_in(&mut first, "127.0.0.1:60001", &["MULTI"]).await,
        simple("OK")
    );

    // The other connection is not in a transaction.
    assert_eq!(
        env.run_in(&mut second, "127.0.0.1:60002", &["SET", "y", "direct"])
            .await,
        simple("OK")
    );
    assert_eq!(
        env.run_in(&mut second, "127.0.0.1:60002", &["EXEC"]).await,
        error("ERR EXEC without MULTI")
    );

    // The first connection's queue is still intact.
    assert_eq!(
        env.run_in(&mut first, "127.0.0.1:60001", &["INCR", "n"]).await,
        simple("QUEUED")
    );
    assert_eq!(
        env.run_in(&mut first, "127.0.0.1:60001", &["EXEC"]).await,
        "*1\r\n:1\r\n"
    );
}

#[tokio::test]
async fn test_exec_captures_nested_replies() {
    let env = TestEnv::new();
    let mut transaction = TransactionState::new();

    env.run(CLIENT, &["RPUSH", "l", "a", "b"]).await;

    env.run_in(&mut transaction, CLIENT, &["MULTI"]).await;
    env.run_in(&mut transaction, CLIENT, &["LRANGE", "l", "0", "-1"]).await;
    env.run_in(&mut transaction, CLIENT, &["GET", "missing"]).await;

    // Arrays and nulls nest inside the EXEC reply unchanged.
    assert_eq!(
        env.run_in(&mut transaction, CLIENT, &["EXEC"]).await,
        "*2\r\n*2\r\n$1\r\na\r\n$1\r\nb\r\n$-1\r\n"
    );
}

#[tokio::test]
async fn test_blocking_commands_do_not_block_inside_exec() {
    let env = TestEnv::new();
    let mut transaction = TransactionState::new();

    env.run_in(&mut transaction, CLIENT, &["MULTI"]).await;
    env.run_in(&mut transaction, CLIENT, &["BLPOP", "empty", "0"]).await;

    let start = tokio::time::Instant::now();
    let reply = env.run_in(&mut transaction, CLIENT, &["EXEC"]).await;

    assert_eq!(reply, "*1\r\n*-1\r\n");
    assert!(start.elapsed() < std::time::Duration::from_millis(500));
}

#[tokio::test]
async fn test_dirty_queue_aborts_and_clears() {
    let env = TestEnv::new();
    let mut transaction = TransactionState::new();

    env.run_in(&mut transaction, CLIENT, &["MULTI"]).await;
    env.run_in(&mut transaction, CLIENT, &["SET", "x", "1"]).await;
    assert_eq!(
        env.run_in(&mut transaction, CLIENT, &["GET"]).await,
        error("ERR wrong number of arguments for 'get' command")
    );
    assert_eq!(
        env.run_in(&mut transaction, CLIENT, &["EXEC"]).await,
        error("EXECABORT Transaction discarded because of previous errors.")
    );

    // The abort cleared the state: a fresh MULTI works normally.
    assert_eq!(
        env.run_in(&mut transaction, CLIENT, &["MULTI"]).await,
        simple("OK")
    );
    assert_eq!(
        env.run_in(&mut transaction, CLIENT, &["INCR", "n"]).await,
        simple("QUEUED")
    );
    assert_eq!(
        env.run_in(&mut transaction, CLIENT, &["EXEC"]).await,
        format!("*1\r\n{}", integer(1))
    );
}
