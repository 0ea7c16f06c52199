mod test_ws_channel;
