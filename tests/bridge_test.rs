// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod support;

use serde_json::{json, Value};
use sshbridge::{Bridge, BridgeConfig, ConnectRequest, ErrorKind};
use support::FakeRemote;

fn bridge(remote: &FakeRemote) -> Bridge {
    Bridge::with_connector(remote.connector(), &BridgeConfig::default())
}

fn request(body: Value) -> ConnectRequest {
    serde_json::from_value(body).unwrap()
}

fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap()
}

#[tokio::test]
async fn test_connect_and_status_replies() {
    let remote = FakeRemote::new();
    let bridge = bridge(&remote);

    let reply = bridge
        .connect(&request(json!({"host": "10.0.0.5", "user": "deploy", "password": "pw"})))
        .await;
    assert_eq!(
        to_json(&reply),
        json!({"status": "success", "message": "SSH connection established successfully"})
    );

    assert_eq!(
        to_json(&bridge.status()),
        json!({"status": "success", "state": "connected", "connected": true, "hasConnection": true})
    );
}

#[tokio::test]
async fn test_connect_without_credentials_is_invalid_config() {
    let remote = FakeRemote::new();
    let bridge = bridge(&remote);

    let reply = bridge
        .connect(&request(json!({"ip": "10.0.0.5", "user": "deploy"})))
        .await;

    assert_eq!(reply.error_kind(), Some(ErrorKind::InvalidConfig));
    let body = to_json(&reply);
    assert_eq!(body["status"], "error");
    assert_eq!(body["kind"], "InvalidConfig");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Either password or SSH key must be provided"));
    assert_eq!(remote.opens(), 0);
}

#[tokio::test]
async fn test_connect_failure_reply() {
    let remote = FakeRemote::new();
    remote.fail_connect("Connection refused");
    let bridge = bridge(&remote);

    let reply = bridge
        .connect(&request(json!({"host": "10.0.0.5", "user": "deploy", "password": "pw"})))
        .await;

    assert_eq!(
        to_json(&reply),
        json!({
            "status": "error",
            "message": "SSH connection failed: Connection refused",
            "kind": "ConnectionError"
        })
    );
    assert_eq!(to_json(&bridge.status())["state"], "disconnected");
}

#[tokio::test]
async fn test_file_replies() {
    let remote = FakeRemote::new();
    remote.set_listing(
        "/tmp",
        "total 4\n-rw-r--r-- 1 deploy deploy 5 Jan 1 00:00 x.txt\n",
    );
    let bridge = bridge(&remote);
    bridge
        .connect(&request(json!({"host": "h", "user": "deploy", "sshKey": "KEY"})))
        .await;

    let written = bridge.write_file("/tmp/x.txt", "hello").await;
    assert_eq!(
        to_json(&written),
        json!({"status": "success", "path": "/tmp/x.txt", "message": "File written successfully"})
    );

    let read = bridge.read_file("/tmp/x.txt").await;
    assert_eq!(
        to_json(&read),
        json!({"status": "success", "path": "/tmp/x.txt", "content": "hello"})
    );

    let listed = to_json(&bridge.list_files(Some("/tmp")).await);
    assert_eq!(listed["status"], "success");
    assert_eq!(listed["path"], "/tmp");
    assert_eq!(listed["totalCount"], 1);
    assert_eq!(
        listed["files"][0],
        json!({
            "name": "x.txt",
            "kind": "file",
            "size": 5,
            "links": 1,
            "permissions": "-rw-r--r--",
            "owner": "deploy",
            "group": "deploy",
            "modifiedDisplay": "Jan 1 00:00"
        })
    );
}

#[tokio::test]
async fn test_operations_before_connect_report_no_session() {
    let remote = FakeRemote::new();
    let bridge = bridge(&remote);

    let replies = [
        to_json(&bridge.list_files(None).await),
        to_json(&bridge.read_file("").await),
        to_json(&bridge.write_file("/tmp/x.txt", "x").await),
    ];

    for reply in replies {
        assert_eq!(
            reply,
            json!({
                "status": "error",
                "message": "SSH connection not established. Please connect first.",
                "kind": "NoSession"
            })
        );
    }
    assert!(remote.events().is_empty());
}

#[tokio::test]
async fn test_read_failure_is_prefixed() {
    let remote = FakeRemote::new();
    let bridge = bridge(&remote);
    bridge
        .connect(&request(json!({"host": "h", "user": "deploy", "password": "pw"})))
        .await;

    let reply = to_json(&bridge.read_file("/missing").await);

    assert_eq!(reply["kind"], "CommandFailure");
    assert_eq!(
        reply["message"],
        "Failed to read file: Command failed with code 1: cat: /missing: No such file or directory"
    );
}

#[tokio::test]
async fn test_disconnect_and_shutdown() {
    let remote = FakeRemote::new();
    let bridge = bridge(&remote);
    bridge
        .connect(&request(json!({"host": "h", "user": "deploy", "password": "pw"})))
        .await;

    let reply = bridge.disconnect().await;
    assert_eq!(
        to_json(&reply),
        json!({"status": "success", "message": "SSH connection disconnected successfully"})
    );
    assert_eq!(remote.closes(), 1);

    bridge.shutdown().await;
    assert_eq!(remote.closes(), 1);
    assert_eq!(
        to_json(&bridge.status()),
        json!({"status": "success", "state": "disconnected", "connected": false, "hasConnection": false})
    );
}
