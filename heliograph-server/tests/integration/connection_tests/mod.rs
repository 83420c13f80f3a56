mod test_duplicate_join_replaces_socket;
mod test_heartbeat_eviction;
mod test_join_snapshot;
mod test_ws_join_snapshot;
