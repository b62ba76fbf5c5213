mod passel_properties;
