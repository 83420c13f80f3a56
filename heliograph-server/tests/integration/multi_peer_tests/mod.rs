mod test_protocol_violations;
mod test_room_lifecycle;
