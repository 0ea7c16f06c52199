mod test_release;
